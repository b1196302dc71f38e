//! Finds a usable host C toolchain (spec §4.9).
//!
//! The Unix probe order (`$CC`, `cc`, `gcc`, `clang`) mirrors the style of
//! the teacher's own external-tool lookups (`which`/`Command::new` probing
//! in `examples/foundry-rs-compilers/src/compile/mod.rs::Solc::version`),
//! generalised from a single fixed binary name to a fallback chain.

use crate::diagnostics::{CompileError, ErrorKind};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainKind {
    /// gcc or clang, invoked with a free-form Unix-style command line.
    Unix,
    /// cl.exe, invoked with `/flag` syntax and a `/link` separator.
    Msvc,
}

/// Paths `CCInvoker` needs to assemble an MSVC command line (spec §4.9
/// point 1-2).
#[derive(Debug, Clone)]
pub struct MsvcPaths {
    pub sdk_includes: Vec<PathBuf>,
    pub sdk_libs: Vec<PathBuf>,
    pub vc_tools_bin: PathBuf,
    pub vc_tools_lib: PathBuf,
    pub vc_tools_include: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Toolchain {
    pub compiler: PathBuf,
    pub kind: ToolchainKind,
    pub msvc: Option<MsvcPaths>,
}

/// Probes `$CC`, then `cc`, `gcc`, `clang` in `$PATH`; first hit wins.
pub fn locate_unix() -> Result<Toolchain, CompileError> {
    locate_unix_with(|name| which::which(name).ok())
}

/// Testable core: takes a lookup function instead of calling `which`
/// directly, so probe order can be verified without touching `$PATH`.
fn locate_unix_with(lookup: impl Fn(&str) -> Option<PathBuf>) -> Result<Toolchain, CompileError> {
    let mut candidates = Vec::new();
    if let Ok(cc) = std::env::var("CC") {
        candidates.push(cc);
    }
    candidates.push("cc".to_string());
    candidates.push("gcc".to_string());
    candidates.push("clang".to_string());

    for candidate in &candidates {
        if let Some(path) = lookup(candidate) {
            return Ok(Toolchain {
                compiler: path,
                kind: ToolchainKind::Unix,
                msvc: None,
            });
        }
    }

    Err(CompileError::new(
        ErrorKind::ToolchainNotFound,
        "no C compiler found ($CC, cc, gcc, clang)",
    ))
}

#[cfg(windows)]
pub fn locate_msvc() -> Result<Toolchain, CompileError> {
    let sdk = locate_windows_sdk()?;
    let vc_tools = locate_vc_tools()?;

    Ok(Toolchain {
        compiler: vc_tools.vc_tools_bin.join("cl.exe"),
        kind: ToolchainKind::Msvc,
        msvc: Some(MsvcPaths {
            sdk_includes: sdk.0,
            sdk_libs: sdk.1,
            vc_tools_bin: vc_tools.vc_tools_bin,
            vc_tools_lib: vc_tools.vc_tools_lib,
            vc_tools_include: vc_tools.vc_tools_include,
        }),
    })
}

#[cfg(windows)]
fn locate_windows_sdk() -> Result<(Vec<PathBuf>, Vec<PathBuf>), CompileError> {
    use winreg::RegKey;
    use winreg::enums::HKEY_LOCAL_MACHINE;

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let key = hklm
        .open_subkey(r"SOFTWARE\Microsoft\Windows Kits\Installed Roots")
        .map_err(|_| {
            CompileError::new(ErrorKind::ToolchainNotFound, "Windows Kits registry key not found")
        })?;

    let kits_root: String = key
        .get_value("KitsRoot10")
        .or_else(|_| key.get_value("KitsRoot81"))
        .map_err(|_| {
            CompileError::new(ErrorKind::ToolchainNotFound, "no KitsRoot10/KitsRoot81 value found")
        })?;
    let kits_root = PathBuf::from(kits_root);

    let lib_root = kits_root.join("Lib");
    let newest_version = std::fs::read_dir(&lib_root)
        .map_err(|_| {
            CompileError::new(ErrorKind::ToolchainNotFound, "Windows Kits Lib directory not found")
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.chars().all(|c| c.is_ascii_digit() || c == '.'))
        .max_by_key(|name| {
            name.split('.')
                .filter_map(|part| part.parse::<u64>().ok())
                .fold(0u64, |acc, part| acc * 100_000 + part)
        })
        .ok_or_else(|| {
            CompileError::new(ErrorKind::ToolchainNotFound, "no Windows Kits version directory found")
        })?;

    let version_lib = lib_root.join(&newest_version);
    let version_include = kits_root.join("Include").join(&newest_version);

    let includes = vec![
        version_include.join("um"),
        version_include.join("ucrt"),
        version_include.join("shared"),
    ];
    let libs = vec![
        version_lib.join("um").join("x64"),
        version_lib.join("ucrt").join("x64"),
    ];

    Ok((includes, libs))
}

#[cfg(windows)]
struct VcTools {
    vc_tools_bin: PathBuf,
    vc_tools_lib: PathBuf,
    vc_tools_include: PathBuf,
}

#[cfg(windows)]
fn locate_vc_tools() -> Result<VcTools, CompileError> {
    use std::process::Command;

    let program_files_x86 =
        std::env::var("ProgramFiles(x86)").unwrap_or_else(|_| r"C:\Program Files (x86)".to_string());
    let vswhere = PathBuf::from(program_files_x86)
        .join(r"Microsoft Visual Studio\Installer\vswhere.exe");

    let output = Command::new(&vswhere)
        .args([
            "-latest",
            "-requires",
            "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
            "-property",
            "installationPath",
        ])
        .output()
        .map_err(|_| {
            CompileError::new(ErrorKind::ToolchainNotFound, "vswhere.exe not found or failed to run")
        })?;

    let installation_path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if installation_path.is_empty() {
        return Err(CompileError::new(
            ErrorKind::ToolchainNotFound,
            "vswhere.exe found no VC.Tools.x86.x64 installation",
        ));
    }

    let installation_path = PathBuf::from(installation_path);
    let version_file = installation_path
        .join(r"VC\Auxiliary\Build\Microsoft.VCToolsVersion.default.txt");
    let version = std::fs::read_to_string(&version_file)
        .map_err(|_| {
            CompileError::new(ErrorKind::ToolchainNotFound, "VCToolsVersion.default.txt not found")
        })?
        .trim()
        .to_string();

    let tools_root = installation_path.join(r"VC\Tools\MSVC").join(&version);
    Ok(VcTools {
        vc_tools_bin: tools_root.join(r"bin\Hostx64\x64"),
        vc_tools_lib: tools_root.join(r"lib\x64"),
        vc_tools_include: tools_root.join("include"),
    })
}
