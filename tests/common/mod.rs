//! Fixtures shared by the integration tests.
//!
//! A shell script stands in for the Python interpreter: it understands the
//! `setup.py` subcommands the pipeline runs and records the install order in
//! the staging destination.

#![allow(dead_code)]

use std::{
    fs,
    io::Write,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

const PYTHON_STUB: &str = r#"#!/bin/sh
here="$(pwd)"
name="$(basename "$here")"
[ "$1" = "setup.py" ] && shift
case "$1" in
  egg_info)
    base="$3"
    mkdir -p "$base/$name.egg-info"
    if [ -f "$here/requires.txt" ]; then
      cp "$here/requires.txt" "$base/$name.egg-info/requires.txt"
    fi
    ;;
  build)
    if [ -f "$here/fail_build" ]; then
      echo "build of $name failed"
      exit 1
    fi
    echo "building $name"
    ;;
  install)
    home="${2#--home=}"
    mkdir -p "$home/lib/python/$name"
    echo "$name" > "$home/lib/python/$name/__init__.py"
    echo "$name" >> "$home/lib/python/install_order.txt"
    ;;
esac
"#;

/// Writes the interpreter stub into `dir` and returns its path.
pub fn python_stub(dir: &Path) -> PathBuf {
    let path = dir.join("python-stub");
    fs::write(&path, PYTHON_STUB).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Source archive formats the fixtures can produce.
#[derive(Clone, Copy)]
pub enum Format {
    TarGz,
    TarBz2,
    Zip,
}

/// Writes `{name}-{version}{suffix}` into `dir`. The archive holds a
/// `{name}-{version}/` source tree with a `setup.py` and, when `requires` is
/// non-empty, a `requires.txt` the stub copies into the metadata cache.
pub fn sdist(dir: &Path, name: &str, version: &str, requires: &[&str], format: Format) -> PathBuf {
    let top = format!("{}-{}", name, version);
    let mut files: Vec<(String, String)> = vec![(
        format!("{}/setup.py", top),
        "from setuptools import setup\nsetup()\n".to_string(),
    )];
    if !requires.is_empty() {
        files.push((format!("{}/requires.txt", top), requires.join("\n") + "\n"));
    }

    match format {
        Format::TarGz => {
            let path = dir.join(format!("{}.tar.gz", top));
            let encoder =
                flate2::write::GzEncoder::new(fs::File::create(&path).unwrap(), Default::default());
            let encoder = write_tar(encoder, &files);
            encoder.finish().unwrap();
            path
        }
        Format::TarBz2 => {
            let path = dir.join(format!("{}.tar.bz2", top));
            let encoder =
                bzip2::write::BzEncoder::new(fs::File::create(&path).unwrap(), Default::default());
            let encoder = write_tar(encoder, &files);
            encoder.finish().unwrap();
            path
        }
        Format::Zip => {
            let path = dir.join(format!("{}.zip", top));
            let mut zip = zip::ZipWriter::new(fs::File::create(&path).unwrap());
            let options = zip::write::SimpleFileOptions::default();
            zip.add_directory(format!("{}/", top), options).unwrap();
            for (name, contents) in &files {
                zip.start_file(name.as_str(), options).unwrap();
                zip.write_all(contents.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
            path
        }
    }
}

fn write_tar<W: Write>(writer: W, files: &[(String, String)]) -> W {
    let mut builder = tar::Builder::new(writer);
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap()
}

/// Lays out project `myproj` under `root`: a `VERSION` file, the top-level
/// requirements file and a static deployment layout.
pub fn project(root: &Path, requirements: &[&str]) -> PathBuf {
    let project = root.join("myproj");
    fs::create_dir_all(project.join("src/myproj")).unwrap();
    fs::write(project.join("src/myproj/VERSION"), "1.0.0\n").unwrap();
    fs::write(project.join("setup.py"), "").unwrap();

    fs::create_dir_all(project.join("project")).unwrap();
    fs::write(
        project.join("project/install_requires.txt"),
        requirements.join("\n") + "\n",
    )
    .unwrap();

    fs::create_dir_all(project.join("pkg/layout/etc/init.d")).unwrap();
    fs::write(project.join("pkg/layout/etc/init.d/myproj"), "#!/bin/sh\n").unwrap();
    project
}

/// Entry paths of a gzip-compressed tarball.
pub fn tarball_entries(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            entry
                .unwrap()
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string()
        })
        .collect()
}

/// Reads one file out of a gzip-compressed tarball.
pub fn tarball_file(path: &Path, name: &str) -> Option<String> {
    use std::io::Read;

    let file = fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.path().unwrap().to_string_lossy() == name {
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            return Some(contents);
        }
    }
    None
}
