use super::Catalog;
use crate::error::Error;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Load a catalog snapshot. A missing file yields `Catalog::empty()`.
pub fn load(path: &Path) -> Result<Catalog, Error> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!("No catalog snapshot at {}, starting empty", path.display());
            return Ok(Catalog::empty());
        }
        Err(err) => return Err(err.into()),
    };

    let catalog: Catalog = bincode::deserialize_from(BufReader::new(file))?;
    debug!(
        "Loaded catalog snapshot {} ({} records, {} tags)",
        path.display(),
        catalog.len(),
        catalog.tags().len()
    );
    Ok(catalog)
}

/// Write the whole catalog to a sibling temp file, then rename it over
/// `path` so readers never observe a partial snapshot.
pub fn save(catalog: &Catalog, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    {
        let mut writer = BufWriter::new(File::create(tmp_path)?);
        bincode::serialize_into(&mut writer, catalog)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(tmp_path, path)?;

    debug!(
        "Saved catalog snapshot {} ({} records)",
        path.display(),
        catalog.len()
    );
    Ok(())
}
