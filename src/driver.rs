//! File-system side of translation: finding units, naming them, writing
//! the listing.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Error;
use crate::translator::{Options, Translator};

const VM_EXTENSION: &str = "vm";

fn is_vm(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(VM_EXTENSION)
}

/// Lists the translation units named by `input`: the file itself, or every
/// `.vm` file directly inside a directory, in path order.
pub fn sources(input: &Path) -> Result<Vec<PathBuf>, Error> {
    let metadata = fs::metadata(input).map_err(|e| Error::io(input, e))?;

    if !metadata.is_dir() {
        if !is_vm(input) {
            return Err(Error::NotVmFile(input.to_path_buf()));
        }
        return Ok(vec![input.to_path_buf()]);
    }

    let mut units = vec![];
    for entry in fs::read_dir(input).map_err(|e| Error::io(input, e))? {
        let path = entry.map_err(|e| Error::io(input, e))?.path();
        if path.is_file() && is_vm(&path) {
            units.push(path);
        }
    }
    if units.is_empty() {
        return Err(Error::NoSources(input.to_path_buf()));
    }
    units.sort();
    Ok(units)
}

/// Name a unit's `static` symbols are prefixed with.
pub fn unit_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `input` with its extension replaced by `.asm`; a directory `dir` maps to
/// the sibling `dir.asm`.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("asm")
}

pub fn translate_files(paths: &[PathBuf], options: Options) -> Result<Vec<String>, Error> {
    let mut translator = Translator::new(options)?;
    for path in paths {
        info!("translating {}", path.display());
        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        translator.translate_unit(&unit_name(path), &path.display().to_string(), &source)?;
    }
    Ok(translator.finish())
}

pub fn write_listing(path: &Path, lines: &[String]) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    for instruction in lines {
        writeln!(out, "{}", instruction).map_err(|e| Error::io(path, e))?;
    }
    out.flush().map_err(|e| Error::io(path, e))
}

/// Translates `input` (a `.vm` file or a directory of them) and writes the
/// listing to `output`, or next to the input when no output is given.
/// Returns the path written.
pub fn run(input: &Path, output: Option<&Path>, options: Options) -> Result<PathBuf, Error> {
    let input = fs::canonicalize(input).map_err(|e| Error::io(input, e))?;
    let units = sources(&input)?;
    let lines = translate_files(&units, options)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(&input));
    write_listing(&output, &lines)?;
    info!("wrote {} lines to {}", lines.len(), output.display());
    Ok(output)
}
