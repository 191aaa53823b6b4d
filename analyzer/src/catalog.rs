//! @ai:module:intent Static registry of internal modules and the API surface each one exposes
//! @ai:module:layer domain
//! @ai:module:public_api ModuleDefinition, ModuleCatalog, header_matches
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../config/catalog.toml");

/// @ai:intent One internal module: its header and the identifiers that count as usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub id: String,
    #[serde(rename = "header")]
    pub header_path: String,
    #[serde(default)]
    pub functions: BTreeSet<String>,
    #[serde(default)]
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub constants: BTreeSet<String>,
}

impl ModuleDefinition {
    /// @ai:intent Check whether an include path refers to this module's header
    /// @ai:effects pure
    pub fn matches_include(&self, include: &str) -> bool {
        header_matches(include, &self.header_path)
    }

    /// @ai:intent Iterate over every identifier the module declares
    /// @ai:effects pure
    pub fn identifiers(&self) -> impl Iterator<Item = &String> {
        self.functions
            .iter()
            .chain(self.types.iter())
            .chain(self.constants.iter())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "module", default)]
    modules: Vec<ModuleDefinition>,
}

/// @ai:intent Read-only mapping from module id to definition, in declaration order
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDefinition>,
    index: HashMap<String, usize>,
}

impl ModuleCatalog {
    /// @ai:intent Build a catalog from definitions, failing on malformed entries
    /// @ai:pre module ids, header paths and declared identifiers are unique across modules
    /// @ai:effects pure
    pub fn new(modules: Vec<ModuleDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(modules.len());
        let mut headers: HashMap<&str, &str> = HashMap::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();

        for (position, module) in modules.iter().enumerate() {
            validate_module(module)?;

            if index.insert(module.id.clone(), position).is_some() {
                return Err(Error::DuplicateModule(module.id.clone()));
            }

            if let Some(first) = headers.insert(module.header_path.as_str(), module.id.as_str()) {
                return Err(Error::DuplicateHeader {
                    header: module.header_path.clone(),
                    first: first.to_string(),
                    second: module.id.clone(),
                });
            }

            for name in module.identifiers() {
                match owners.insert(name.as_str(), module.id.as_str()) {
                    Some(first) if first != module.id => {
                        return Err(Error::DuplicateIdentifier {
                            identifier: name.clone(),
                            first: first.to_string(),
                            second: module.id.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(Self { modules, index })
    }

    /// @ai:intent Parse a catalog from TOML text
    /// @ai:effects pure
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.modules)
    }

    /// @ai:intent Load a catalog from a TOML file
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// @ai:intent The embedded catalog of the internal embedded modules
    /// @ai:effects pure
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// @ai:intent Look up a module definition by id
    /// @ai:effects pure
    pub fn lookup(&self, id: &str) -> Result<&ModuleDefinition> {
        self.get(id)
            .ok_or_else(|| Error::ModuleNotFound(id.to_string()))
    }

    /// @ai:intent Look up a module definition by id, returning None when absent
    /// @ai:effects pure
    pub fn get(&self, id: &str) -> Option<&ModuleDefinition> {
        self.index.get(id).map(|&position| &self.modules[position])
    }

    /// @ai:intent All module definitions in declaration order
    /// @ai:effects pure
    pub fn all(&self) -> &[ModuleDefinition] {
        &self.modules
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// @ai:intent Component-wise path suffix match between an include and a header path
/// @ai:example ("xgpio_hal.h", "internal_modules/hal/xgpio_hal.h") -> true
/// @ai:example ("../internal_modules/hal/xgpio_hal.h", "internal_modules/hal/xgpio_hal.h") -> true
/// @ai:example ("my_xgpio_hal.h", "internal_modules/hal/xgpio_hal.h") -> false
/// @ai:effects pure
pub fn header_matches(include: &str, header: &str) -> bool {
    let include = path_components(include);
    let header = path_components(header);

    if include.is_empty() || header.is_empty() {
        return false;
    }

    let shorter = include.len().min(header.len());
    include[include.len() - shorter..] == header[header.len() - shorter..]
}

fn path_components(path: &str) -> Vec<&str> {
    path.trim()
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}

fn validate_module(module: &ModuleDefinition) -> Result<()> {
    let invalid = |message: String| Error::InvalidModule {
        module: module.id.clone(),
        message,
    };

    if module.id.trim().is_empty() {
        return Err(invalid("module id is empty".to_string()));
    }

    if path_components(&module.header_path).is_empty() {
        return Err(invalid("header path is empty".to_string()));
    }

    if let Some(name) = module.identifiers().find(|name| !is_identifier(name)) {
        return Err(invalid(format!("'{}' is not a valid C identifier", name)));
    }

    Ok(())
}

/// @ai:intent Check that a name is a valid C identifier
/// @ai:effects pure
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn module(id: &str, header: &str, functions: &[&str]) -> ModuleDefinition {
        ModuleDefinition {
            id: id.to_string(),
            header_path: header.to_string(),
            functions: functions.iter().map(|s| s.to_string()).collect(),
            types: BTreeSet::new(),
            constants: BTreeSet::new(),
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = ModuleCatalog::builtin().unwrap();

        assert_eq!(catalog.len(), 19);
        let gpio = catalog.lookup("xgpio_hal").unwrap();
        assert_eq!(gpio.header_path, "internal_modules/hal/xgpio_hal.h");
        assert!(gpio.functions.contains("xgpio_init_pin"));
        assert!(gpio.types.contains("xgpio_config_t"));
        assert!(gpio.constants.contains("XGPIO_PIN_HIGH"));
        assert_eq!(catalog.all()[0].id, "xgpio_hal");
    }

    #[test]
    fn test_lookup_unknown_module() {
        let catalog = ModuleCatalog::builtin().unwrap();
        assert!(matches!(
            catalog.lookup("xnothing"),
            Err(Error::ModuleNotFound(id)) if id == "xnothing"
        ));
        assert!(catalog.get("xnothing").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = ModuleCatalog::new(vec![
            module("xa", "a/xa.h", &["xa_init"]),
            module("xa", "a/xb.h", &["xb_init"]),
        ]);
        assert!(matches!(result, Err(Error::DuplicateModule(id)) if id == "xa"));
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let result = ModuleCatalog::new(vec![
            module("xa", "a/x.h", &["xa_init"]),
            module("xb", "a/x.h", &["xb_init"]),
        ]);
        assert!(matches!(result, Err(Error::DuplicateHeader { .. })));
    }

    #[test]
    fn test_identifier_shared_across_modules_rejected() {
        let result = ModuleCatalog::new(vec![
            module("xa", "a/xa.h", &["x_init", "xa_read"]),
            module("xb", "b/xb.h", &["xb_read", "x_init"]),
        ]);
        assert!(matches!(
            result,
            Err(Error::DuplicateIdentifier { identifier, first, second })
                if identifier == "x_init" && first == "xa" && second == "xb"
        ));

        let mut shared_kind = module("xa", "a/xa.h", &["xa_status"]);
        shared_kind.types.insert("xa_status".to_string());
        assert!(ModuleCatalog::new(vec![shared_kind]).is_ok());
    }

    #[test]
    fn test_invalid_entries_rejected() {
        assert!(ModuleCatalog::new(vec![module("", "a/x.h", &[])]).is_err());
        assert!(ModuleCatalog::new(vec![module("xa", "  ", &[])]).is_err());
        assert!(ModuleCatalog::new(vec![module("xa", "a/x.h", &["2fast"])]).is_err());
        assert!(ModuleCatalog::new(vec![module("xa", "a/x.h", &["xa-init"])]).is_err());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = ModuleCatalog::from_toml_str("[[module]]\nid = 3\n");
        assert!(matches!(result, Err(Error::CatalogParse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[module]]\nid = \"xled\"\nheader = \"drivers/xled.h\"\nfunctions = [\"xled_on\", \"xled_off\"]\n"
        )
        .unwrap();

        let catalog = ModuleCatalog::load(file.path()).unwrap();
        let led = catalog.lookup("xled").unwrap();
        assert_eq!(led.functions.len(), 2);
        assert!(led.types.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ModuleCatalog::load(Path::new("/nonexistent/catalog.toml"));
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }

    #[test]
    fn test_header_matches() {
        let header = "internal_modules/hal/xgpio_hal.h";

        assert!(header_matches(header, header));
        assert!(header_matches("xgpio_hal.h", header));
        assert!(header_matches("hal/xgpio_hal.h", header));
        assert!(header_matches("../internal_modules/hal/xgpio_hal.h", header));
        assert!(header_matches("./xgpio_hal.h", header));
        assert!(!header_matches("my_xgpio_hal.h", header));
        assert!(!header_matches("sensors/xgpio_hal.h", header));
        assert!(!header_matches("", header));
    }
}
