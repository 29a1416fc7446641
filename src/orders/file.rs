use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::api::{is_valid_rest_link, Order};
use crate::errors::{Error, Result};
use crate::orders::{Ledger, OrderStore};

/// Prefix of the files holding the completed orders
pub const COMPLETED_PREFIX: &str = "completed-";

/// Order store keeping one JSON file per restaurant and ledger
///
/// `<dir>/<rest_link>.json` holds the pending orders, `<dir>/completed-<rest_link>.json` the
/// completed ones. Files are rewritten entirely on every store.
pub struct JsonFileOrderStore {
    dir: PathBuf,
}

impl JsonFileOrderStore {
    /// Open the store in `dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(JsonFileOrderStore {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Path of the record of a ledger
    ///
    /// Restaurant links end up in file names, anything that could leave the directory is
    /// refused.
    pub fn path(&self, rest_link: &str, ledger: Ledger) -> Result<PathBuf> {
        if !is_valid_rest_link(rest_link) {
            return Err(Error::BadRequest(format!("Invalid restaurant link {:?}", rest_link)).into());
        }
        let file_name = match ledger {
            Ledger::Pending => format!("{}.json", rest_link),
            Ledger::Completed => format!("{}{}.json", COMPLETED_PREFIX, rest_link),
        };
        Ok(self.dir.join(file_name))
    }
}

impl OrderStore for JsonFileOrderStore {
    fn load(&self, rest_link: &str, ledger: Ledger) -> Result<Vec<Order>> {
        let path = self.path(rest_link, ledger)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                log::warn!("Cannot read {}, assuming no orders: {}", path.display(), err);
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Option<Vec<Order>>>(&content) {
            Ok(orders) => Ok(orders.unwrap_or_default()),
            Err(err) => {
                log::warn!("Corrupt order record {}, assuming no orders: {}", path.display(), err);
                Ok(Vec::new())
            }
        }
    }

    fn store(&self, rest_link: &str, ledger: Ledger, orders: &[Order]) -> Result<()> {
        let path = self.path(rest_link, ledger)?;
        let content = to_tab_indented_json(orders)?;
        fs::write(&path, content).map_err(|err| {
            log::error!("Failed to write {}: {}", path.display(), err);
            Error::Persistence(format!("{}: {}", path.display(), err)).into()
        })
    }
}

/// Serialize with one tab per indentation level, the format the order files have always had
fn to_tab_indented_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
