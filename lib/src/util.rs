use std::fs;

use yaml_rust::{Yaml, YamlLoader};

use crate::error::{Result, SimulationError};

pub fn load_yaml(file_path: &str) -> Result<Vec<Yaml>> {
    if !file_path.ends_with(".yaml") && !file_path.ends_with(".yml") {
        return Err(SimulationError::YamlParse {
            path: file_path.to_owned(),
            message: "not a .yaml or .yml file".to_owned(),
        });
    }
    let file_content = fs::read_to_string(file_path).map_err(|source| SimulationError::Io {
        path: file_path.to_owned(),
        source,
    })?;
    load_yaml_str(&file_content, file_path)
}

pub fn load_yaml_str(content: &str, origin: &str) -> Result<Vec<Yaml>> {
    YamlLoader::load_from_str(content).map_err(|err| SimulationError::YamlParse {
        path: origin.to_owned(),
        message: err.to_string(),
    })
}
