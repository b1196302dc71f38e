//! Assembles and runs the host toolchain command line (spec §4.10).

use crate::diagnostics::{CompileError, ErrorKind};
use crate::preferences::Preferences;
use crate::toolchain::locator::{Toolchain, ToolchainKind};
use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;
use std::process::Command;

const MSVC_DEFAULT_LIBS: &[&str] = &[
    "kernel32", "user32", "gdi32", "advapi32", "shell32", "ole32", "oleaut32", "uuid", "odbc32",
    "odbccp32", "winspool", "comdlg32",
];

/// A single `#flag` directive, already classified by its leading token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFlag {
    Library(String),
    IncludeDir(String),
    LibDir(String),
    Raw(String),
}

pub fn classify_flag(flag: &str) -> LinkFlag {
    let flag = flag.trim();
    if let Some(rest) = flag.strip_prefix("-l") {
        LinkFlag::Library(rest.trim().to_string())
    } else if let Some(rest) = flag.strip_prefix("-I") {
        LinkFlag::IncludeDir(rest.trim().to_string())
    } else if let Some(rest) = flag.strip_prefix("-L") {
        LinkFlag::LibDir(rest.trim().to_string())
    } else {
        LinkFlag::Raw(flag.to_string())
    }
}

pub struct CCInvoker<'a> {
    toolchain: &'a Toolchain,
}

impl<'a> CCInvoker<'a> {
    pub fn new(toolchain: &'a Toolchain) -> Self {
        CCInvoker { toolchain }
    }

    /// Builds the full argv for compiling `source` into `out_name`, without
    /// running it — exposed separately from [`Self::invoke`] so tests can
    /// assert on argument shape without a real toolchain installed.
    pub fn build_args(&self, prefs: &Preferences, flags: &[LinkFlag], source: &Path, out_name: &str) -> Vec<String> {
        match self.toolchain.kind {
            ToolchainKind::Unix => self.build_unix_args(prefs, flags, source, out_name),
            ToolchainKind::Msvc => self.build_msvc_args(prefs, flags, source, out_name),
        }
    }

    fn build_unix_args(&self, prefs: &Preferences, flags: &[LinkFlag], source: &Path, out_name: &str) -> Vec<String> {
        let mut args = Vec::new();
        if !prefs.cflags.is_empty() {
            args.extend(prefs.cflags.split_whitespace().map(str::to_string));
        }
        if prefs.build_mode == crate::preferences::BuildMode::BuildModule {
            args.push("-c".to_string());
        } else if prefs.is_so {
            args.push("-shared".to_string());
            args.push("-fPIC".to_string());
        }
        if prefs.is_debug {
            args.push("-g".to_string());
        }
        if prefs.is_prod {
            args.push("-O2".to_string());
        }
        if prefs.sanitize {
            args.push("-fsanitize=address,undefined".to_string());
        }

        args.push(source.display().to_string());

        if prefs.build_mode == crate::preferences::BuildMode::Default {
            let stdlib_object = prefs.stdlib_object_path();
            if stdlib_object.is_file() {
                args.push(stdlib_object.display().to_string());
            }
        }

        for flag in flags {
            match flag {
                LinkFlag::Library(name) => args.push(format!("-l{name}")),
                LinkFlag::IncludeDir(dir) => args.push(format!("-I{dir}")),
                LinkFlag::LibDir(dir) => args.push(format!("-L{dir}")),
                LinkFlag::Raw(raw) => args.push(raw.clone()),
            }
        }

        args.push("-o".to_string());
        args.push(out_name.to_string());
        args
    }

    fn build_msvc_args(&self, prefs: &Preferences, flags: &[LinkFlag], source: &Path, out_name: &str) -> Vec<String> {
        let msvc = self.toolchain.msvc.as_ref();
        let mut args = vec![
            "/nologo".to_string(),
            if prefs.is_debug { "/Z7".to_string() } else { "/DEBUG:NONE".to_string() },
            format!("/MD{}", if prefs.is_debug { "d" } else { "" }),
        ];
        if prefs.is_so {
            args.push("/LD".to_string());
        }

        args.push(rewrite_msvc_source(source));
        args.push(format!("/Fo{out_name}.obj"));

        if let Some(msvc) = msvc {
            for include in &msvc.sdk_includes {
                args.push(format!("-I\"{}\"", include.display()));
            }
            args.push(format!("-I\"{}\"", msvc.vc_tools_include.display()));
        }

        args.push("/link".to_string());
        args.push(format!("/OUT:{out_name}"));

        if prefs.build_mode == crate::preferences::BuildMode::Default {
            let stdlib_object = prefs.stdlib_object_path();
            if stdlib_object.is_file() {
                args.push(rewrite_object_extension(&stdlib_object.display().to_string()));
            }
        }

        if let Some(msvc) = msvc {
            for lib_dir in &msvc.sdk_libs {
                args.push(format!("/LIBPATH:\"{}\"", lib_dir.display()));
                args.push(format!("/LIBPATH:\"{}\\msvc\\\"", lib_dir.display()));
            }
            args.push(format!("/LIBPATH:\"{}\"", msvc.vc_tools_lib.display()));
            args.push(format!("/LIBPATH:\"{}\\msvc\\\"", msvc.vc_tools_lib.display()));
        }

        for flag in flags {
            match flag {
                LinkFlag::Library(name) => args.push(format!("{name}.lib")),
                LinkFlag::IncludeDir(dir) => args.push(format!("-I\"{dir}\"")),
                LinkFlag::LibDir(dir) => {
                    args.push(format!("/LIBPATH:\"{dir}\""));
                    args.push(format!("/LIBPATH:\"{dir}\\msvc\\\""));
                }
                LinkFlag::Raw(raw) => args.push(rewrite_object_extension(raw)),
            }
        }

        for lib in MSVC_DEFAULT_LIBS {
            args.push(format!("{lib}.lib"));
        }

        args
    }

    pub fn invoke(&self, prefs: &Preferences, flags: &[LinkFlag], source: &Path, out_name: &str) -> Result<(), CompileError> {
        for flag in flags {
            if let LinkFlag::Library(name) = flag {
                if self.toolchain.kind == ToolchainKind::Msvc && name.ends_with(".dll") {
                    return Err(CompileError::new(
                        ErrorKind::UnsupportedLinkDirective,
                        format!("cannot link '{name}' directly under MSVC; link its .lib import library instead"),
                    ));
                }
            }
        }

        let args = self.build_args(prefs, flags, source, out_name);
        let output = Command::new(&self.toolchain.compiler)
            .args(&args)
            .output()
            .map_err(|e| {
                CompileError::new(
                    ErrorKind::CompileFailure,
                    format!("failed to invoke {}: {e}", self.toolchain.compiler.display()),
                )
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CompileError::new(ErrorKind::CompileFailure, "C compiler reported errors")
                .with_note(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }
}

fn rewrite_msvc_source(source: &Path) -> String {
    format!("\"{}\"", source.display())
}

fn rewrite_object_extension(raw: &str) -> String {
    if raw.ends_with(".o") {
        format!("{}.obj", &raw[..raw.len() - 2])
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::TargetOs;

    fn unix_toolchain() -> Toolchain {
        Toolchain {
            compiler: PathBuf::from("/usr/bin/cc"),
            kind: ToolchainKind::Unix,
            msvc: None,
        }
    }

    fn msvc_toolchain() -> Toolchain {
        use crate::toolchain::locator::MsvcPaths;
        Toolchain {
            compiler: PathBuf::from(r"C:\VC\cl.exe"),
            kind: ToolchainKind::Msvc,
            msvc: Some(MsvcPaths {
                sdk_includes: vec![PathBuf::from(r"C:\sdk\um")],
                sdk_libs: vec![PathBuf::from(r"C:\sdk\lib\um\x64")],
                vc_tools_bin: PathBuf::from(r"C:\VC\bin"),
                vc_tools_lib: PathBuf::from(r"C:\VC\lib\x64"),
                vc_tools_include: PathBuf::from(r"C:\VC\include"),
            }),
        }
    }

    #[test]
    fn flags_are_classified_by_leading_token() {
        assert_eq!(classify_flag("-lm"), LinkFlag::Library("m".into()));
        assert_eq!(classify_flag("-Iinclude"), LinkFlag::IncludeDir("include".into()));
        assert_eq!(classify_flag("-Llib"), LinkFlag::LibDir("lib".into()));
        assert_eq!(classify_flag("--raw-thing"), LinkFlag::Raw("--raw-thing".into()));
    }

    #[test]
    fn unix_args_end_with_dash_o_and_out_name() {
        let toolchain = unix_toolchain();
        let invoker = CCInvoker::new(&toolchain);
        let prefs = Preferences::default();
        let args = invoker.build_args(&prefs, &[], Path::new("a.tmp.c"), "a.out");
        assert_eq!(args[args.len() - 2], "-o");
        assert_eq!(args[args.len() - 1], "a.out");
    }

    #[test]
    fn unix_shared_build_adds_shared_and_fpic() {
        let toolchain = unix_toolchain();
        let invoker = CCInvoker::new(&toolchain);
        let mut prefs = Preferences::default();
        prefs.is_so = true;
        let args = invoker.build_args(&prefs, &[], Path::new("a.tmp.c"), "a.so");
        assert!(args.contains(&"-shared".to_string()));
        assert!(args.contains(&"-fPIC".to_string()));
    }

    #[test]
    fn default_mode_links_a_precompiled_stdlib_object_when_present() {
        let toolchain = unix_toolchain();
        let invoker = CCInvoker::new(&toolchain);
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(crate::preferences::STDLIB_OBJECT_NAME), b"").unwrap();

        let mut prefs = Preferences::default();
        prefs.stdlib_root = tmp.path().to_path_buf();
        let args = invoker.build_args(&prefs, &[], Path::new("a.tmp.c"), "a.out");
        assert!(args.iter().any(|a| a.ends_with("stdlib.o")));
    }

    #[test]
    fn default_mode_omits_the_stdlib_object_when_it_does_not_exist() {
        let toolchain = unix_toolchain();
        let invoker = CCInvoker::new(&toolchain);
        let tmp = tempfile::tempdir().unwrap();

        let mut prefs = Preferences::default();
        prefs.stdlib_root = tmp.path().to_path_buf();
        let args = invoker.build_args(&prefs, &[], Path::new("a.tmp.c"), "a.out");
        assert!(!args.iter().any(|a| a.ends_with("stdlib.o")));
    }

    #[test]
    fn embed_stdlib_mode_never_links_the_stdlib_object() {
        let toolchain = unix_toolchain();
        let invoker = CCInvoker::new(&toolchain);
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(crate::preferences::STDLIB_OBJECT_NAME), b"").unwrap();

        let mut prefs = Preferences::default();
        prefs.stdlib_root = tmp.path().to_path_buf();
        prefs.build_mode = crate::preferences::BuildMode::EmbedStdlib;
        let args = invoker.build_args(&prefs, &[], Path::new("a.tmp.c"), "a.out");
        assert!(!args.iter().any(|a| a.ends_with("stdlib.o")));
    }

    #[test]
    fn msvc_args_use_link_separator_and_rewrite_dash_l() {
        let toolchain = msvc_toolchain();
        let invoker = CCInvoker::new(&toolchain);
        let prefs = Preferences::default();
        let flags = vec![LinkFlag::Library("m".to_string())];
        let args = invoker.build_args(&prefs, &flags, Path::new("a.tmp.c"), "a.exe");
        assert!(args.contains(&"/link".to_string()));
        assert!(args.contains(&"m.lib".to_string()));
        for default_lib in MSVC_DEFAULT_LIBS {
            assert!(args.contains(&format!("{default_lib}.lib")));
        }
    }

    #[test]
    fn msvc_rejects_dll_link_directive() {
        let toolchain = msvc_toolchain();
        let invoker = CCInvoker::new(&toolchain);
        let prefs = Preferences::default();
        let flags = vec![LinkFlag::Library("foo.dll".to_string())];
        let err = invoker
            .invoke(&prefs, &flags, Path::new("a.tmp.c"), "a.exe")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedLinkDirective);
    }

    #[test]
    fn msvc_rewrites_dot_o_object_references_to_dot_obj() {
        assert_eq!(rewrite_object_extension("helper.o"), "helper.obj");
        assert_eq!(rewrite_object_extension("helper.c"), "helper.c");
    }

    #[test]
    fn host_target_selection_is_not_js_or_msvc_by_default() {
        assert!(!TargetOs::host().is_js());
    }
}
