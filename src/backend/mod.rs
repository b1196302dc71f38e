//! Back-end selection (spec §1: "portable C as its primary back-end, with
//! an optional JavaScript back-end and a native-code back-end stub").
//!
//! Grounded on the teacher's `build_system::create_project_builder` dispatch
//! (examples/nyejames-beanstalk/src/build_system/build_system.rs): a small
//! enum describing the target, and a matching constructor that returns the
//! right collaborator. The C path is the one real, fully driven backend —
//! it owns toolchain discovery and invocation. The JS and native paths are
//! left as stubs for the same reason the teacher's own `JitProjectBuilder`
//! produces no output files: the reference frontend (spec §1 AMBIENT note)
//! only ever emits C, so there is nothing correct to hand either of them.

use crate::diagnostics::{CompileError, ErrorKind};
use crate::preferences::{Preferences, TargetOs};
use crate::toolchain::cc_invoker::{CCInvoker, LinkFlag};
use crate::toolchain::locator::{self, Toolchain};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// gcc/clang/MSVC, invoking the host C toolchain.
    C,
    /// Not implemented by the reference frontend; selecting it is a hard
    /// error rather than emitting output nothing downstream can run.
    Js,
    /// Not implemented; see module docs.
    Native,
}

pub fn select_backend(prefs: &Preferences) -> BackendKind {
    match prefs.target_os {
        TargetOs::Js => BackendKind::Js,
        _ => BackendKind::C,
    }
}

/// Runs the selected backend to completion: for [`BackendKind::C`], locates
/// a host toolchain and invokes it over `source`; the stub backends return
/// `CompileFailure` describing what's missing.
pub fn run_backend(
    kind: BackendKind,
    prefs: &Preferences,
    flags: &[LinkFlag],
    source: &Path,
    out_name: &str,
) -> Result<(), CompileError> {
    match kind {
        BackendKind::C => {
            let toolchain = locate_toolchain(prefs)?;
            CCInvoker::new(&toolchain).invoke(prefs, flags, source, out_name)
        }
        BackendKind::Js => Err(CompileError::new(
            ErrorKind::CompileFailure,
            "JavaScript back-end selected but the reference frontend only emits C; no JS codegen is available",
        )),
        BackendKind::Native => Err(CompileError::new(
            ErrorKind::CompileFailure,
            "native-code back-end is a stub and does not produce output",
        )),
    }
}

fn locate_toolchain(prefs: &Preferences) -> Result<Toolchain, CompileError> {
    if prefs.target_os.is_msvc() {
        #[cfg(windows)]
        {
            locator::locate_msvc()
        }
        #[cfg(not(windows))]
        {
            // `-os msvc` on a non-Windows host is an invalid flag combination
            // (spec.md:179), not a toolchain that simply failed to be found;
            // `apply_flags` already rejects it at parse time, this is a
            // second line of defense for callers that build `Preferences`
            // directly.
            Err(CompileError::new(
                ErrorKind::InvalidFlag,
                "MSVC target requested on a non-Windows host",
            ))
        }
    } else {
        locator::locate_unix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::Preferences;

    #[test]
    fn js_target_selects_the_js_backend() {
        let mut prefs = Preferences::default();
        prefs.target_os = TargetOs::Js;
        assert_eq!(select_backend(&prefs), BackendKind::Js);
    }

    #[test]
    fn default_target_selects_the_c_backend() {
        let prefs = Preferences::default();
        assert_eq!(select_backend(&prefs), BackendKind::C);
    }

    #[test]
    fn js_backend_fails_clearly_instead_of_emitting_garbage() {
        let mut prefs = Preferences::default();
        prefs.target_os = TargetOs::Js;
        let err = run_backend(BackendKind::Js, &prefs, &[], Path::new("a.tmp.c"), "a.out").unwrap_err();
        assert_eq!(err.kind, ErrorKind::CompileFailure);
    }

    #[test]
    #[cfg(not(windows))]
    fn msvc_target_on_non_windows_host_is_invalid_flag() {
        let mut prefs = Preferences::default();
        prefs.target_os = TargetOs::Msvc;
        let err = locate_toolchain(&prefs).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFlag);
    }
}
