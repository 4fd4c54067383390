//! Zip extraction and shapefile lookup.

use std::path::{Path, PathBuf};

use crate::AcquisitionError;

/// Extracts every entry of `archive_path` under `dest`.
///
/// Entries whose names would escape `dest` are skipped.
///
/// # Errors
///
/// Returns [`AcquisitionError`] if the archive cannot be opened or an entry
/// cannot be written.
pub fn extract(archive_path: &Path, dest: &Path) -> Result<usize, AcquisitionError> {
    log::info!(
        "Extracting {} into {}",
        archive_path.display(),
        dest.display()
    );

    let zip_error = |source| AcquisitionError::Zip {
        path: archive_path.display().to_string(),
        source,
    };

    let file =
        std::fs::File::open(archive_path).map_err(|e| AcquisitionError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_error)?;

    std::fs::create_dir_all(dest).map_err(|e| AcquisitionError::io(dest, e))?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;

        let Some(relative) = entry.enclosed_name() else {
            log::warn!("  skipping unsafe entry name: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| AcquisitionError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AcquisitionError::io(parent, e))?;
        }
        let mut out =
            std::fs::File::create(&out_path).map_err(|e| AcquisitionError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| AcquisitionError::io(&out_path, e))?;
        extracted += 1;
    }

    log::info!("  extracted {extracted} files");
    Ok(extracted)
}

/// Finds the first `.shp` file under `dir`, searching subdirectories in
/// name order.
///
/// # Errors
///
/// Returns [`AcquisitionError::MissingShapefile`] if there is none.
pub fn find_shapefile(dir: &Path) -> Result<PathBuf, AcquisitionError> {
    find_by_extension(dir, "shp")?
        .ok_or_else(|| AcquisitionError::MissingShapefile(dir.display().to_string()))
}

fn find_by_extension(dir: &Path, ext: &str) -> Result<Option<PathBuf>, AcquisitionError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| AcquisitionError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AcquisitionError::io(dir, e))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let mut subdirs = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        {
            return Ok(Some(path));
        }
    }

    for subdir in subdirs {
        if let Some(found) = find_by_extension(&subdir, ext)? {
            return Ok(Some(found));
        }
    }

    Ok(None)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::scratch::ScratchDir;

    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip_writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            zip_writer.start_file(*name, options).unwrap();
            zip_writer.write_all(data).unwrap();
        }
        zip_writer.finish().unwrap();
    }

    #[test]
    fn extracts_nested_shapefile() {
        let scratch = ScratchDir::create().unwrap();
        let zip_path = scratch.path().join("torn.zip");
        write_zip(
            &zip_path,
            &[
                ("1950-2017-torn-aspath/readme.txt", b"SPC tornado tracks"),
                ("1950-2017-torn-aspath/1950-2017-torn-aspath.dbf", b"dbf"),
                ("1950-2017-torn-aspath/1950-2017-torn-aspath.shp", b"shp"),
            ],
        );

        let dest = scratch.path().join("out");
        assert_eq!(extract(&zip_path, &dest).unwrap(), 3);

        let shp = find_shapefile(&dest).unwrap();
        assert_eq!(
            shp,
            dest.join("1950-2017-torn-aspath/1950-2017-torn-aspath.shp")
        );
        assert_eq!(std::fs::read(&shp).unwrap(), b"shp");
    }

    #[test]
    fn archive_without_shapefile() {
        let scratch = ScratchDir::create().unwrap();
        let zip_path = scratch.path().join("empty.zip");
        write_zip(&zip_path, &[("notes.txt", b"nothing here")]);

        let dest = scratch.path().join("out");
        extract(&zip_path, &dest).unwrap();
        let err = find_shapefile(&dest).unwrap_err();
        assert!(matches!(err, AcquisitionError::MissingShapefile(_)));
    }

    #[test]
    fn corrupt_archive_is_a_zip_error() {
        let scratch = ScratchDir::create().unwrap();
        let zip_path = scratch.path().join("broken.zip");
        std::fs::write(&zip_path, b"not a zip file").unwrap();

        let err = extract(&zip_path, &scratch.path().join("out")).unwrap_err();
        assert!(matches!(err, AcquisitionError::Zip { .. }));
    }
}
