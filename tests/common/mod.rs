//! Shared fixtures: a fake FFmpeg checkout with mock compiler and converter.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Mock `cl.exe`: records its arguments, copies the input (last argument)
/// into the `-Fi` target, echoes the input's base name the way MSVC does,
/// prints one real-looking line, and exits with the code in `./cl_exit`
/// (default 0). Runs with the project root as its working directory.
pub const FAKE_CL: &str = r#"#!/bin/sh
out=""
last=""
: > args.txt
for a in "$@"; do
  printf '%s\n' "$a" >> args.txt
  case "$a" in
    -Fi*) out="${a#-Fi}" ;;
  esac
  last="$a"
done
printf '/* preprocessed */\n' > "$out"
cat "$last" >> "$out"
basename "$last"
echo "note: kept line" 1>&2
if [ -f cl_exit ]; then exit "$(cat cl_exit)"; fi
exit 0
"#;

/// Mock converter: marks that it ran, writes `/* c89 */` plus the input to the
/// output, and exits with the code in `./converter_exit` (default 0).
pub const FAKE_CONVERTER: &str = r#"#!/bin/sh
touch converter_called
{ echo '/* c89 */'; cat "$1"; } > "$2"
if [ -f converter_exit ]; then exit "$(cat converter_exit)"; fi
exit 0
"#;

pub struct Fixture {
    pub dir: TempDir,
    /// `<tmp>/src/third_party/ffmpeg`; the build env lives at `<tmp>/chromium.gyp_env`.
    pub root: PathBuf,
    pub input: PathBuf,
    pub fake_cl: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("src/third_party/ffmpeg");
        std::fs::create_dir_all(root.join("chromium/binaries")).unwrap();
        std::fs::create_dir_all(root.join("libavcodec")).unwrap();
        write_script(&root.join("chromium/binaries/c99conv.exe"), FAKE_CONVERTER);

        let fake_cl = dir.path().join("fake_cl.sh");
        write_script(&fake_cl, FAKE_CL);

        let input = root.join("libavcodec/vp8.c");
        std::fs::write(&input, "int vp8_decode(void) { for (int i = 0; i < 4; i++) {} return 0; }\n")
            .unwrap();

        Self {
            dir,
            root,
            input,
            fake_cl,
        }
    }

    pub fn build_env_path(&self) -> PathBuf {
        self.dir.path().join("chromium.gyp_env")
    }

    pub fn write_build_env(&self, contents: &str) {
        std::fs::write(self.build_env_path(), contents).unwrap();
    }

    /// Point `CC` in the build environment at the mock compiler.
    pub fn use_fake_cl_via_build_env(&self) {
        self.write_build_env(&format!(
            "{{\n  # GOMA-style wrapper\n  'CC': 'sh {}',\n}}\n",
            self.fake_cl.display()
        ));
    }

    pub fn fake_cl_command(&self) -> String {
        format!("sh {}", self.fake_cl.display())
    }

    pub fn set_compiler_exit(&self, code: i32) {
        std::fs::write(self.root.join("cl_exit"), code.to_string()).unwrap();
    }

    pub fn set_converter_exit(&self, code: i32) {
        std::fs::write(self.root.join("converter_exit"), code.to_string()).unwrap();
    }

    pub fn intermediate(&self) -> PathBuf {
        self.root.join("libavcodec/vp8.c_preprocessed.c")
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn converter_called(&self) -> bool {
        self.root.join("converter_called").exists()
    }

    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.root.join("args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub fn write_script(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
