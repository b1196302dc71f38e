//! Emits the live-mode (`-live`) hot-reload shim into the C output
//! (spec §4.8), triggered when `Preferences.is_live` is set.
//!
//! Unlink ordering: the temporary shared object is only unlinked *after*
//! the next successful rebind, never right after `dlopen`/`LoadLibraryA` —
//! a crash between load and unlink would otherwise leave `load_so`
//! pointing at a deleted file on platforms where that isn't safe.

use crate::driver::cgen_sink::CGenSink;
use crate::preferences::Preferences;

/// Emits the mutex, `load_so`, and `reload_so` triplet. `so_fns` (already
/// recorded on the sink by the main pass) are the symbols `load_so` must
/// rebind on every successful reload.
pub fn emit_hot_reload_shim(sink: &mut CGenSink, prefs: &Preferences, source_stem: &str) {
    let so_fns = sink.so_fns().to_vec();
    if prefs.target_os.is_windows() {
        emit_windows_shim(sink, source_stem, &so_fns);
    } else {
        emit_posix_shim(sink, source_stem, &so_fns);
    }
}

fn emit_posix_shim(sink: &mut CGenSink, source_stem: &str, so_fns: &[String]) {
    sink.push_include("#include <dlfcn.h>");
    sink.push_include("#include <pthread.h>");
    sink.push_include("#include <sys/stat.h>");
    sink.push_include("#include <unistd.h>");

    sink.emit_line("static pthread_mutex_t __hot_reload_mutex = PTHREAD_MUTEX_INITIALIZER;");
    sink.emit_line("static void *__hot_reload_handle = NULL;");
    sink.emit_line("static char *__hot_reload_prev_path = NULL;");
    sink.emit_line("static long __hot_reload_mtime = 0;");
    sink.emit_line("static int __hot_reload_version = 0;");
    sink.emit_line("");
    sink.emit_line("static int load_so(const char *path) {");
    sink.emit_line("    void *handle = dlopen(path, RTLD_NOW);");
    sink.emit_line("    if (!handle) { return 0; }");
    for symbol in so_fns {
        sink.emit_line(format!(
            "    *(void **)(&{symbol}) = dlsym(handle, \"{symbol}\");"
        ));
    }
    sink.emit_line("    __hot_reload_handle = handle;");
    sink.emit_line("    return 1;");
    sink.emit_line("}");
    sink.emit_line("");
    sink.emit_line("static void *reload_so(void *unused) {");
    sink.emit_line("    (void)unused;");
    sink.emit_line("    for (;;) {");
    sink.emit_line("        struct stat st;");
    sink.emit_line(format!(
        "        if (stat(\"{source_stem}.v\", &st) == 0 && (long)st.st_mtime != __hot_reload_mtime) {{"
    ));
    sink.emit_line("            __hot_reload_mtime = (long)st.st_mtime;");
    sink.emit_line("            __hot_reload_version += 1;");
    sink.emit_line("            char tmp_path[512];");
    sink.emit_line(format!(
        "            snprintf(tmp_path, sizeof(tmp_path), \".tmp.%d.{source_stem}.so\", __hot_reload_version);"
    ));
    sink.emit_line("            char build_cmd[1024];");
    sink.emit_line(format!(
        "            snprintf(build_cmd, sizeof(build_cmd), \"%s build -shared -o %s {source_stem}.v\", __hot_reload_self_path, tmp_path);"
    ));
    sink.emit_line("            if (system(build_cmd) == 0) {");
    sink.emit_line("                void *old_handle = __hot_reload_handle;");
    sink.emit_line("                char *old_path = __hot_reload_prev_path;");
    sink.emit_line("                pthread_mutex_lock(&__hot_reload_mutex);");
    sink.emit_line("                int rebound = load_so(tmp_path);");
    sink.emit_line("                if (rebound) { __hot_reload_prev_path = strdup(tmp_path); }");
    sink.emit_line("                pthread_mutex_unlock(&__hot_reload_mutex);");
    sink.emit_line("                if (rebound) {");
    sink.emit_line("                    if (old_handle) { dlclose(old_handle); }");
    sink.emit_line("                    if (old_path) { unlink(old_path); free(old_path); }");
    sink.emit_line("                } else {");
    sink.emit_line("                    unlink(tmp_path);");
    sink.emit_line("                }");
    sink.emit_line("            }");
    sink.emit_line("        }");
    sink.emit_line("        usleep(200000);");
    sink.emit_line("    }");
    sink.emit_line("    return NULL;");
    sink.emit_line("}");
}

fn emit_windows_shim(sink: &mut CGenSink, source_stem: &str, so_fns: &[String]) {
    sink.push_include("#include <windows.h>");

    sink.emit_line("static HANDLE __hot_reload_mutex;");
    sink.emit_line("static HMODULE __hot_reload_handle = NULL;");
    sink.emit_line("static char __hot_reload_prev_path[MAX_PATH] = {0};");
    sink.emit_line("static FILETIME __hot_reload_mtime = {0};");
    sink.emit_line("static int __hot_reload_version = 0;");
    sink.emit_line("");
    sink.emit_line("static int load_so(const char *path) {");
    sink.emit_line("    HMODULE handle = LoadLibraryA(path);");
    sink.emit_line("    if (!handle) { return 0; }");
    for symbol in so_fns {
        sink.emit_line(format!(
            "    *(FARPROC *)(&{symbol}) = GetProcAddress(handle, \"{symbol}\");"
        ));
    }
    sink.emit_line("    __hot_reload_handle = handle;");
    sink.emit_line("    return 1;");
    sink.emit_line("}");
    sink.emit_line("");
    sink.emit_line("static DWORD WINAPI reload_so(LPVOID unused) {");
    sink.emit_line("    (void)unused;");
    sink.emit_line("    for (;;) {");
    sink.emit_line("        WIN32_FILE_ATTRIBUTE_DATA attrs;");
    sink.emit_line(format!(
        "        if (GetFileAttributesExA(\"{source_stem}.v\", GetFileExInfoStandard, &attrs) &&"
    ));
    sink.emit_line("            CompareFileTime(&attrs.ftLastWriteTime, &__hot_reload_mtime) != 0) {");
    sink.emit_line("            __hot_reload_mtime = attrs.ftLastWriteTime;");
    sink.emit_line("            __hot_reload_version += 1;");
    sink.emit_line("            char tmp_path[MAX_PATH];");
    sink.emit_line(format!(
        "            wsprintfA(tmp_path, \".tmp.%d.{source_stem}.dll\", __hot_reload_version);"
    ));
    sink.emit_line("            char build_cmd[1024];");
    sink.emit_line(format!(
        "            wsprintfA(build_cmd, \"%s build -shared -o %s {source_stem}.v\", __hot_reload_self_path, tmp_path);"
    ));
    sink.emit_line("            if (system(build_cmd) == 0) {");
    sink.emit_line("                HMODULE old_handle = __hot_reload_handle;");
    sink.emit_line("                char old_path[MAX_PATH];");
    sink.emit_line("                lstrcpyA(old_path, __hot_reload_prev_path);");
    sink.emit_line("                WaitForSingleObject(__hot_reload_mutex, INFINITE);");
    sink.emit_line("                int rebound = load_so(tmp_path);");
    sink.emit_line("                if (rebound) { lstrcpyA(__hot_reload_prev_path, tmp_path); }");
    sink.emit_line("                ReleaseMutex(__hot_reload_mutex);");
    sink.emit_line("                if (rebound) {");
    sink.emit_line("                    if (old_handle) { FreeLibrary(old_handle); }");
    sink.emit_line("                    if (old_path[0]) { DeleteFileA(old_path); }");
    sink.emit_line("                } else {");
    sink.emit_line("                    DeleteFileA(tmp_path);");
    sink.emit_line("                }");
    sink.emit_line("            }");
    sink.emit_line("        }");
    sink.emit_line("        Sleep(200);");
    sink.emit_line("    }");
    sink.emit_line("    return 0;");
    sink.emit_line("}");
}
