use crate::{
    apply,
    kubemodel::{ObjectKind, WorkloadKind, WorkloadObject},
};
use serde::Deserialize;
use serde_json::{json, Value};
use serde_yaml_with_quirks::DeserializingQuirks;
use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse yaml: {0}")]
    Yaml(#[from] serde_yaml_with_quirks::Error),
    #[error("document {index} is not an object")]
    NotAnObject { index: usize },
    #[error("document {index} has no kind: {source}")]
    MissingKind {
        index: usize,
        source: serde_json::Error,
    },
    #[error("failed to decode {kind}: {source}")]
    Decode {
        kind: ObjectKind,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] apply::Error),
}
pub type Result<T> = std::result::Result<T, Error>;

/// Read manifest sources, `-` stands for stdin
pub fn read_sources(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            if path == Path::new("-") {
                let mut out = String::new();
                io::stdin()
                    .read_to_string(&mut out)
                    .map_err(|source| Error::Read {
                        path: path.clone(),
                        source,
                    })?;
                Ok(out)
            } else {
                fs::read_to_string(path).map_err(|source| Error::Read {
                    path: path.clone(),
                    source,
                })
            }
        })
        .collect()
}

/// Split `kind: List` documents into their items
fn flatten(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Null => {}
        Value::Object(mut obj)
            if obj.get("kind").and_then(Value::as_str) == Some("List")
                && obj.get("items").map(Value::is_array).unwrap_or(false) =>
        {
            if let Some(Value::Array(items)) = obj.remove("items") {
                for item in items {
                    flatten(item, out);
                }
            }
        }
        value => out.push(value),
    }
}

fn decode(index: usize, mut value: Value) -> Result<WorkloadObject> {
    if !value.is_object() {
        return Err(Error::NotAnObject { index });
    }
    let kind = ObjectKind::deserialize(&value)
        .map_err(|source| Error::MissingKind { index, source })?;
    let workload = apply::validate_kind(&kind)?;

    // Older CronJob versions are decoded as batch/v1
    value["apiVersion"] = json!("batch/v1");
    let decoded = match workload {
        WorkloadKind::Job => serde_json::from_value(value).map(WorkloadObject::Job),
        WorkloadKind::CronJob => serde_json::from_value(value).map(WorkloadObject::CronJob),
    };
    decoded.map_err(|source| Error::Decode { kind, source })
}

/// Parse multi-document yaml.
///
/// Whole input is rejected if any of documents has unsupported kind.
pub fn parse(text: &str) -> Result<Vec<WorkloadObject>> {
    let mut values = vec![];
    for document in serde_yaml_with_quirks::Deserializer::from_str_with_quirks(
        text,
        DeserializingQuirks { old_octals: true },
    ) {
        flatten(Value::deserialize(document)?, &mut values);
    }
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| decode(index, value))
        .collect()
}

/// Read and parse every source, in order
pub fn load(paths: &[PathBuf]) -> Result<Vec<WorkloadObject>> {
    let mut out = vec![];
    for source in read_sources(paths)? {
        out.extend(parse(&source)?);
    }
    Ok(out)
}

/// Put objects without namespace to `namespace`
pub fn default_namespace(objects: &mut [WorkloadObject], namespace: &str) {
    for object in objects {
        let meta = object.meta_mut();
        if meta.namespace.as_deref().unwrap_or("").is_empty() {
            meta.namespace = Some(namespace.to_owned());
        }
    }
}
