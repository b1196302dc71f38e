//! Immutable compile-session configuration (spec §3 `Preferences`).
//!
//! Mirrors the teacher's `Config` (`examples/nyejames-beanstalk/src/settings.rs`):
//! a plain struct built once from CLI args (and, here, an optional project
//! manifest) and then passed by reference into every other component for
//! the rest of the run.

use crate::diagnostics::{CompileError, ErrorKind};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSION: &str = "v";
pub const HEADER_EXTENSION: &str = "vh";
pub const MANIFEST_FILE_NAME: &str = "v.mod";
pub const DEFAULT_OUT_NAME: &str = "a.out";

/// Precompiled stdlib object `CCInvoker` links into a `default_mode` build
/// (spec §4.10) instead of recompiling every stdlib source it already fed
/// through the main pass. Looked up under `stdlib_root`.
pub const STDLIB_OBJECT_NAME: &str = "stdlib.o";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Default,
    EmbedStdlib,
    BuildModule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOs {
    Mac,
    Linux,
    Windows,
    FreeBsd,
    OpenBsd,
    NetBsd,
    Dragonfly,
    Msvc,
    Js,
}

impl TargetOs {
    /// The host target, used when `-os` is not passed.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::Mac
        } else if cfg!(target_os = "freebsd") {
            TargetOs::FreeBsd
        } else if cfg!(target_os = "openbsd") {
            TargetOs::OpenBsd
        } else if cfg!(target_os = "netbsd") {
            TargetOs::NetBsd
        } else if cfg!(target_os = "dragonfly") {
            TargetOs::Dragonfly
        } else {
            TargetOs::Linux
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "mac" | "macos" | "darwin" => TargetOs::Mac,
            "linux" => TargetOs::Linux,
            "windows" | "win" => TargetOs::Windows,
            "freebsd" => TargetOs::FreeBsd,
            "openbsd" => TargetOs::OpenBsd,
            "netbsd" => TargetOs::NetBsd,
            "dragonfly" => TargetOs::Dragonfly,
            "msvc" => TargetOs::Msvc,
            "js" => TargetOs::Js,
            _ => return None,
        })
    }

    /// Whether this target uses the MSVC back end rather than gcc/clang.
    pub fn is_msvc(self) -> bool {
        matches!(self, TargetOs::Msvc)
    }

    pub fn is_windows(self) -> bool {
        matches!(self, TargetOs::Windows | TargetOs::Msvc)
    }

    pub fn is_js(self) -> bool {
        matches!(self, TargetOs::Js)
    }
}

#[derive(Debug, Clone)]
pub struct Preferences {
    pub build_mode: BuildMode,
    pub target_os: TargetOs,

    pub is_test: bool,
    pub is_script: bool,
    pub is_live: bool,
    pub is_so: bool,
    pub is_prof: bool,
    pub is_prod: bool,
    pub is_debug: bool,
    pub is_verbose: bool,
    pub sanitize: bool,
    pub obfuscate: bool,
    pub translated: bool,
    pub autofree: bool,
    pub building_self: bool,

    pub cflags: String,
    pub c_compiler: Option<String>,
    pub out_name: String,
    pub out_name_c: String,
    pub dir: PathBuf,
    pub module_name: String,
    pub stdlib_root: PathBuf,
}

impl Preferences {
    /// The `.tmp.c` path the driver emits into before invoking the toolchain.
    pub fn tmp_c_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.tmp.c", self.out_name))
    }

    /// The precompiled stdlib object `CCInvoker` links in `default_mode`,
    /// if one has actually been built into `stdlib_root`.
    pub fn stdlib_object_path(&self) -> PathBuf {
        self.stdlib_root.join(STDLIB_OBJECT_NAME)
    }

    /// Final artifact name, with the platform-appropriate suffix applied.
    pub fn final_out_name(&self) -> String {
        if self.build_mode == BuildMode::BuildModule {
            format!("{}.o", self.out_name)
        } else if self.is_so {
            if self.target_os.is_windows() {
                format!("{}.dll", self.out_name)
            } else {
                format!("{}.so", self.out_name)
            }
        } else if self.target_os.is_windows() {
            format!("{}.exe", self.out_name)
        } else {
            self.out_name.clone()
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        let stdlib_root = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.join("stdlib")))
            .unwrap_or_else(|| PathBuf::from("stdlib"));

        Preferences {
            build_mode: BuildMode::Default,
            target_os: TargetOs::host(),

            is_test: false,
            is_script: false,
            is_live: false,
            is_so: false,
            is_prof: false,
            is_prod: false,
            is_debug: false,
            is_verbose: false,
            sanitize: false,
            obfuscate: false,
            translated: false,
            autofree: false,
            building_self: false,

            cflags: String::new(),
            c_compiler: env::var("CC").ok(),
            out_name: DEFAULT_OUT_NAME.to_string(),
            out_name_c: String::new(),
            dir: PathBuf::new(),
            module_name: String::new(),
            stdlib_root,
        }
    }
}

/// Parsed `v.mod` project manifest. Entirely optional — absence is not an
/// error, a malformed file is (`InvalidFlag`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_license")]
    pub license: String,
    #[serde(default)]
    pub libraries: Vec<PathBuf>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_license() -> String {
    "MIT".to_string()
}

/// Looks for `v.mod` directly under `dir` and parses it if present.
pub fn load_manifest(dir: &Path) -> Result<Option<ManifestFile>, CompileError> {
    let manifest_path = dir.join(MANIFEST_FILE_NAME);
    if !manifest_path.is_file() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&manifest_path)
        .map_err(|e| CompileError::file_error(&manifest_path, format!("cannot read v.mod: {e}")))?;

    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| CompileError::new(ErrorKind::InvalidFlag, format!("malformed v.mod: {e}")).with_file(&manifest_path))
}
