// imports
use crate::basis::BasisMapping;
use crate::error::{SpaceError, SpaceResult};
use crate::index_vector::IndexVector;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};


/// Reads an item saved by [`save_output`], `file_path` being given without its extension.
pub fn read_input<R: ReadFile>(file_path: &str) -> SpaceResult<R> {
    R::read_file(file_path)
}

/// Saves `item` as `output_dir/file_name` plus the extension of its format.
pub fn save_output<S: SaveFile>(output_dir: &str, file_name: &str, item: &S) -> SpaceResult<()> {

    // create output folder
    fs::create_dir_all(output_dir)?;
    item.save_file(output_dir, file_name)
}

pub trait ReadFile: Sized {
    fn read_file(file_path: &str) -> SpaceResult<Self>;
}

pub trait SaveFile {
    fn save_file(&self, output_dir: &str, file_name: &str) -> SpaceResult<()>;
}


// index vectors are saved as gzipped bincode, they are the bulk of a saved run
impl ReadFile for HashMap<String, IndexVector> {
    fn read_file(file_path: &str) -> SpaceResult<Self> {
        let in_file = file_path.to_string() + ".bin.gz";
        let reader = GzDecoder::new(BufReader::new(File::open(in_file)?));
        let item = bincode::deserialize_from(reader)?;
        Ok(item)
    }
}

impl SaveFile for HashMap<String, IndexVector> {
    fn save_file(&self, output_dir: &str, file_name: &str) -> SpaceResult<()> {
        let out = output_dir.to_string() + "/" + file_name + ".bin.gz";
        let mut writer = GzEncoder::new(BufWriter::new(File::create(out)?), Compression::default());
        bincode::serialize_into(&mut writer, self)?;
        writer.finish()?.flush()?;
        Ok(())
    }
}

impl ReadFile for BasisMapping<String> {
    fn read_file(file_path: &str) -> SpaceResult<Self> {
        let in_file = file_path.to_string() + ".json";
        let f = BufReader::new(File::open(in_file)?);
        let item = serde_json::from_reader(f)?;
        Ok(item)
    }
}

impl SaveFile for BasisMapping<String> {
    fn save_file(&self, output_dir: &str, file_name: &str) -> SpaceResult<()> {
        let out = output_dir.to_string() + "/" + file_name + ".json";
        let mut f = BufWriter::new(File::create(out)?);
        serde_json::to_writer(&mut f, self)?;
        f.flush().map_err(SpaceError::from)
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::store::IndexVectorStore;

    #[test]
    fn index_vectors_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("run").display().to_string();

        let store: IndexVectorStore<String> = IndexVectorStore::new(256, 6, 0, 1).unwrap();
        for word in ["the", "quick", "fox"] {
            store.vector_for(&word.to_string()).unwrap();
        }
        let mapping = store.export_mapping();
        save_output(&output_dir, "index_vectors", &mapping).unwrap();

        let loaded: HashMap<String, IndexVector> = read_input(&(output_dir.clone() + "/index_vectors")).unwrap();
        assert_eq!(loaded, mapping);

        let mut fresh: IndexVectorStore<String> = IndexVectorStore::new(256, 6, 0, 2).unwrap();
        fresh.import_mapping(loaded).unwrap();
        assert_eq!(fresh.vector_for(&"fox".to_string()).unwrap().as_ref(), &mapping["fox"]);
    }

    #[test]
    fn basis_survives_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().display().to_string();

        let basis = BasisMapping::new();
        for word in ["a", "b"] {
            basis.dimension_of(&word.to_string());
        }
        save_output(&output_dir, "basis", &basis).unwrap();
        let loaded: BasisMapping<String> = read_input(&(output_dir + "/basis")).unwrap();
        assert_eq!(loaded.keys(), basis.keys());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result: SpaceResult<BasisMapping<String>> = read_input("no/such/basis");
        assert!(matches!(result, Err(SpaceError::Io(_))));
    }
}
