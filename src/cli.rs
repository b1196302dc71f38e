//! Hand-rolled command line parsing (spec §6), matching the teacher's own
//! `get_command`/`get_flags` split (`examples/nyejames-beanstalk/src/cli.rs`)
//! rather than reaching for `clap`: the verb grammar here (`build module
//! <path>` is two words, a bare path with no verb means "just compile") is
//! irregular enough that a derive-based parser would fight the grammar more
//! than it would save.

use crate::diagnostics::{print_error, CompileError, ErrorKind};
use crate::preferences::{BuildMode, Preferences, TargetOs};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// No verb: just compile `path` to `Preferences.out_name`.
    Compile(PathBuf),
    /// `v run <path>`: compile, then execute the artifact and forward its exit code.
    Run(PathBuf),
    /// `v test <path>`: compile in test mode and run the resulting binary.
    Test(PathBuf),
    /// `v build module <path>`: compile a single module to a standalone object.
    BuildModule(PathBuf),
    /// `v install`: advisory, not yet implemented — prints a notice, exits 0.
    Install,
    /// `v fmt [path]`: advisory, not yet implemented.
    Fmt(Option<PathBuf>),
    /// `v symlink`: advisory, not yet implemented.
    Symlink,
    /// `v up`: advisory, not yet implemented.
    Up,
    Version,
    Help,
}

/// Splits `VFLAGS` on whitespace and prepends it to the real argv, as spec
/// §6 requires, so that both environment-default flags and ones passed on
/// the actual command line are parsed through the same path.
pub fn effective_args(real_args: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    if let Ok(vflags) = std::env::var("VFLAGS") {
        args.extend(vflags.split_whitespace().map(str::to_string));
    }
    args.extend(real_args.iter().cloned());
    args
}

/// Picks the verb (and its path argument, if any) out of the non-flag
/// positional arguments. Flags are parsed separately by [`apply_flags`].
pub fn get_command(args: &[String]) -> Result<Command, String> {
    let positionals = positional_args(args);

    match positionals.first().map(|s| s.as_str()) {
        None => Err("no input files to compile".to_string()),
        Some("help") => Ok(Command::Help),
        Some("version") => Ok(Command::Version),
        Some("install") => Ok(Command::Install),
        Some("symlink") => Ok(Command::Symlink),
        Some("up") => Ok(Command::Up),
        Some("fmt") => Ok(Command::Fmt(positionals.get(1).map(|s| PathBuf::from(s.as_str())))),
        Some("run") => path_arg(&positionals, 1).map(Command::Run),
        Some("test") => path_arg(&positionals, 1).map(Command::Test),
        Some("build") => match positionals.get(1).map(|s| s.as_str()) {
            Some("module") => path_arg(&positionals, 2).map(Command::BuildModule),
            _ => Err("expected 'build module <path>'".to_string()),
        },
        Some(_) => Ok(Command::Compile(PathBuf::from(positionals[0]))),
    }
}

const VALUE_TAKING_FLAGS: &[&str] = &["-o", "-os", "-cflags"];

/// Strips every flag from `args`, also skipping the following argument for
/// flags known to take a value, leaving only the verb/path positionals.
fn positional_args(args: &[String]) -> Vec<&String> {
    let mut positionals = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if is_flag(&args[i]) {
            if VALUE_TAKING_FLAGS.contains(&args[i].as_str()) {
                i += 1;
            }
        } else {
            positionals.push(&args[i]);
        }
        i += 1;
    }
    positionals
}

fn path_arg(positionals: &[&String], index: usize) -> Result<PathBuf, String> {
    positionals
        .get(index)
        .map(|s| PathBuf::from(s.as_str()))
        .ok_or_else(|| "missing path argument".to_string())
}

fn is_flag(arg: &str) -> bool {
    arg.starts_with('-')
}

/// Applies every recognised flag (spec §6) onto `prefs`, consuming
/// value-taking flags' following argument. Unknown `-`-prefixed arguments
/// are `InvalidFlag`.
pub fn apply_flags(prefs: &mut Preferences, args: &[String]) -> Result<(), CompileError> {
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-o" => {
                prefs.out_name = next_value(args, &mut i, "-o")?;
            }
            "-os" => {
                let name = next_value(args, &mut i, "-os")?;
                let target = TargetOs::parse(&name).ok_or_else(|| {
                    CompileError::new(ErrorKind::InvalidFlag, format!("unknown target os: {name}"))
                })?;
                if target.is_msvc() && !cfg!(windows) {
                    return Err(CompileError::new(
                        ErrorKind::InvalidFlag,
                        "MSVC target requested on a non-Windows host",
                    ));
                }
                prefs.target_os = target;
            }
            "-cflags" => {
                prefs.cflags = next_value(args, &mut i, "-cflags")?;
            }
            "-prod" => prefs.is_prod = true,
            "-debug" | "-g" => prefs.is_debug = true,
            "-live" => prefs.is_live = true,
            "-shared" => prefs.is_so = true,
            "-prof" => prefs.is_prof = true,
            "-obf" => prefs.obfuscate = true,
            "-verbose" => prefs.is_verbose = true,
            "-autofree" => prefs.autofree = true,
            "-sanitize" => prefs.sanitize = true,
            "-repl" => prefs.is_script = true,
            "-usecache" => prefs.build_mode = BuildMode::Default,
            "-embed_stdlib" => prefs.build_mode = BuildMode::EmbedStdlib,
            // Advisory flags this reference driver doesn't act on yet, but
            // still needs to recognise rather than reject.
            "-show_c_cmd" | "-compress" | "-nofmt" => {}
            other if is_flag(other) => {
                return Err(CompileError::new(
                    ErrorKind::InvalidFlag,
                    format!("unrecognised flag: {other}"),
                ));
            }
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, CompileError> {
    *i += 1;
    args.get(*i).cloned().ok_or_else(|| {
        CompileError::new(ErrorKind::InvalidFlag, format!("{flag} requires a value"))
    })
}

/// Runs the full CLI: parses `args`, builds `Preferences`, and dispatches
/// to the right driver entry point. Returns the process exit code (spec §6
/// "Exit codes": 0 success, 1 any fatal error, forwarded under `run`).
pub fn run_cli(args: &[String]) -> i32 {
    let command = match get_command(args) {
        Ok(command) => command,
        Err(message) => {
            print_error(&CompileError::new(ErrorKind::InvalidFlag, message));
            return 1;
        }
    };

    if matches!(command, Command::Help) {
        print_help();
        return 0;
    }
    if matches!(command, Command::Version) {
        println!(env!("CARGO_PKG_VERSION"));
        return 0;
    }
    if matches!(command, Command::Install | Command::Symlink | Command::Up) {
        println!("not yet implemented; nothing to do");
        return 0;
    }
    if let Command::Fmt(_) = command {
        println!("formatter not yet implemented; nothing to do");
        return 0;
    }

    let mut prefs = Preferences::default();
    if let Err(err) = apply_flags(&mut prefs, args) {
        print_error(&err);
        return 1;
    }

    match command {
        Command::Test(path) => {
            prefs.is_test = true;
            build_then_execute(&prefs, &path)
        }
        Command::BuildModule(path) => {
            prefs.build_mode = BuildMode::BuildModule;
            if prefs.out_name == crate::preferences::DEFAULT_OUT_NAME
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                prefs.out_name = name.to_string();
            }
            run_build_only(&prefs, &path)
        }
        Command::Run(path) => build_then_execute(&prefs, &path),
        Command::Compile(path) => run_build_only(&prefs, &path),
        _ => 0,
    }
}

fn run_build_only(prefs: &Preferences, path: &Path) -> i32 {
    match crate::build::build(prefs, path) {
        Ok(()) => 0,
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

/// Builds, then executes the resulting artifact and forwards its exit
/// status, used by both `v run` and `v test` (a test build's `main`
/// already sums assertion failures into its own return code).
fn build_then_execute(prefs: &Preferences, path: &Path) -> i32 {
    if let Err(err) = crate::build::build(prefs, path) {
        print_error(&err);
        return 1;
    }

    let artifact_name = prefs.final_out_name();
    let artifact = std::fs::canonicalize(&artifact_name).unwrap_or_else(|_| PathBuf::from(&artifact_name));
    match std::process::Command::new(&artifact).status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            print_error(&CompileError::new(
                ErrorKind::ToolchainNotFound,
                format!("could not execute {}: {e}", artifact.display()),
            ));
            1
        }
    }
}

fn print_help() {
    println!("Usage: v [verb] [path] [flags]");
    println!();
    println!("Verbs:");
    println!("  run <path>           compile and immediately execute the result");
    println!("  test <path>          compile in test mode and run the discovered tests");
    println!("  build module <path>  compile a single module to a standalone object");
    println!("  install              (advisory) installs the package manager");
    println!("  fmt [path]           (advisory) formats source files");
    println!("  symlink              (advisory) symlinks the compiler onto PATH");
    println!("  up                   (advisory) self-updates the compiler");
    println!("  version              prints the compiler version");
    println!("  help                 prints this message");
    println!();
    println!("Flags:");
    println!("  -o <name>    -os <target>   -prod   -debug   -g   -live   -shared");
    println!("  -prof   -obf   -verbose   -show_c_cmd   -autofree   -compress");
    println!("  -sanitize   -cflags <str>   -nofmt   -repl   -usecache   -embed_stdlib");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_path_is_a_plain_compile() {
        let args = vec!["hello.v".to_string()];
        assert_eq!(get_command(&args).unwrap(), Command::Compile(PathBuf::from("hello.v")));
    }

    #[test]
    fn run_verb_takes_the_following_path() {
        let args = vec!["run".to_string(), "main.v".to_string()];
        assert_eq!(get_command(&args).unwrap(), Command::Run(PathBuf::from("main.v")));
    }

    #[test]
    fn build_module_is_a_two_word_verb() {
        let args = vec!["build".to_string(), "module".to_string(), "stdlib/os".to_string()];
        assert_eq!(
            get_command(&args).unwrap(),
            Command::BuildModule(PathBuf::from("stdlib/os"))
        );
    }

    #[test]
    fn build_without_module_keyword_is_an_error() {
        let args = vec!["build".to_string(), "main.v".to_string()];
        assert!(get_command(&args).is_err());
    }

    #[test]
    fn flags_interleaved_with_the_path_do_not_confuse_verb_detection() {
        let args = vec!["-verbose".to_string(), "run".to_string(), "-o".to_string(), "out".to_string(), "main.v".to_string()];
        assert_eq!(get_command(&args).unwrap(), Command::Run(PathBuf::from("main.v")));
    }

    #[test]
    fn no_input_is_an_error() {
        assert!(get_command(&[]).is_err());
    }

    #[test]
    fn dash_o_sets_the_output_name() {
        let mut prefs = Preferences::default();
        let args = vec!["-o".to_string(), "myapp".to_string()];
        apply_flags(&mut prefs, &args).unwrap();
        assert_eq!(prefs.out_name, "myapp");
    }

    #[test]
    fn dash_os_parses_the_target() {
        let mut prefs = Preferences::default();
        let args = vec!["-os".to_string(), "linux".to_string()];
        apply_flags(&mut prefs, &args).unwrap();
        assert_eq!(prefs.target_os, TargetOs::Linux);
    }

    #[test]
    fn unknown_os_is_an_invalid_flag() {
        let mut prefs = Preferences::default();
        let args = vec!["-os".to_string(), "amiga".to_string()];
        let err = apply_flags(&mut prefs, &args).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFlag);
    }

    #[test]
    #[cfg(not(windows))]
    fn msvc_os_on_non_windows_host_is_an_invalid_flag() {
        let mut prefs = Preferences::default();
        let args = vec!["-os".to_string(), "msvc".to_string()];
        let err = apply_flags(&mut prefs, &args).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFlag);
    }

    #[test]
    fn dash_embed_stdlib_sets_the_build_mode() {
        let mut prefs = Preferences::default();
        let args = vec!["-embed_stdlib".to_string()];
        apply_flags(&mut prefs, &args).unwrap();
        assert_eq!(prefs.build_mode, BuildMode::EmbedStdlib);
    }

    #[test]
    fn unrecognised_flag_is_rejected() {
        let mut prefs = Preferences::default();
        let args = vec!["-bogus".to_string()];
        let err = apply_flags(&mut prefs, &args).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFlag);
    }

    #[test]
    fn boolean_flags_set_their_preference() {
        let mut prefs = Preferences::default();
        let args = vec!["-live".to_string(), "-shared".to_string(), "-debug".to_string()];
        apply_flags(&mut prefs, &args).unwrap();
        assert!(prefs.is_live);
        assert!(prefs.is_so);
        assert!(prefs.is_debug);
    }

    #[test]
    fn vflags_env_var_is_prepended() {
        unsafe {
            std::env::set_var("VFLAGS", "-verbose -debug");
        }
        let args = effective_args(&["main.v".to_string()]);
        unsafe {
            std::env::remove_var("VFLAGS");
        }
        assert_eq!(args, vec!["-verbose", "-debug", "main.v"]);
    }
}
