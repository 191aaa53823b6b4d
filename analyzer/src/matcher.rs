//! @ai:module:intent Detect which catalog modules and identifiers a source text uses
//! @ai:module:layer application
//! @ai:module:public_api MatchResult, SourceMatcherTrait, SourceMatcher
//! @ai:module:depends_on catalog, lexer
//! @ai:module:stateless true

use crate::catalog::{ModuleCatalog, ModuleDefinition};
use crate::lexer::{LexedSource, Lexer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// @ai:intent Inventory of catalog usage found in one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Include paths in order of appearance, internal or not
    pub includes: Vec<String>,
    pub modules_included: BTreeSet<String>,
    pub functions_used: BTreeMap<String, BTreeSet<String>>,
    pub types_used: BTreeMap<String, BTreeSet<String>>,
    pub constants_used: BTreeMap<String, BTreeSet<String>>,
    /// Identifiers of modules whose header is not included
    pub unincluded_usage: BTreeMap<String, BTreeSet<String>>,
}

impl MatchResult {
    /// @ai:intent Check whether a module's header is included
    /// @ai:effects pure
    pub fn is_included(&self, module_id: &str) -> bool {
        self.modules_included.contains(module_id)
    }

    /// @ai:intent Check whether a function is used in any included module
    /// @ai:effects pure
    pub fn uses_function(&self, name: &str) -> bool {
        self.functions_used.values().any(|set| set.contains(name))
    }

    /// @ai:intent Check whether any catalog identifier of an included module matches name
    /// @ai:effects pure
    pub fn uses_identifier(&self, name: &str) -> bool {
        [&self.functions_used, &self.types_used, &self.constants_used]
            .iter()
            .any(|map| map.values().any(|set| set.contains(name)))
    }

    pub fn function_count(&self) -> usize {
        count(&self.functions_used)
    }

    pub fn type_count(&self) -> usize {
        count(&self.types_used)
    }

    pub fn constant_count(&self) -> usize {
        count(&self.constants_used)
    }

    /// @ai:intent All matched function names across included modules, sorted
    /// @ai:effects pure
    pub fn all_functions(&self) -> BTreeSet<&str> {
        flatten(&self.functions_used)
    }

    pub fn all_types(&self) -> BTreeSet<&str> {
        flatten(&self.types_used)
    }

    pub fn all_constants(&self) -> BTreeSet<&str> {
        flatten(&self.constants_used)
    }
}

fn count(map: &BTreeMap<String, BTreeSet<String>>) -> usize {
    map.values().map(BTreeSet::len).sum()
}

fn flatten(map: &BTreeMap<String, BTreeSet<String>>) -> BTreeSet<&str> {
    map.values().flatten().map(String::as_str).collect()
}

/// @ai:intent Trait for catalog matching over preprocessed source
pub trait SourceMatcherTrait: Send + Sync {
    /// @ai:intent Match a lexed source against the catalog
    fn match_lexed(&self, source: &LexedSource, catalog: &ModuleCatalog) -> MatchResult;

    /// @ai:intent Match raw source text against the catalog
    fn match_source(&self, text: &str, catalog: &ModuleCatalog) -> MatchResult;
}

/// @ai:intent Default catalog matcher over C-family source
pub struct SourceMatcher {
    lexer: Lexer,
}

impl SourceMatcher {
    pub fn new() -> Self {
        Self {
            lexer: Lexer::default(),
        }
    }

    pub fn with_lexer(lexer: Lexer) -> Self {
        Self { lexer }
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }
}

impl Default for SourceMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceMatcherTrait for SourceMatcher {
    /// @ai:intent Match a lexed source against the catalog
    /// @ai:post every matched set is a subset of the corresponding catalog set
    /// @ai:effects pure
    fn match_lexed(&self, source: &LexedSource, catalog: &ModuleCatalog) -> MatchResult {
        let mut result = MatchResult {
            includes: source.includes().to_vec(),
            ..Default::default()
        };

        for module in catalog.all() {
            let included = source
                .includes()
                .iter()
                .any(|include| module.matches_include(include));

            if included {
                result.modules_included.insert(module.id.clone());
                insert_used(&mut result.functions_used, module, &module.functions, source);
                insert_used(&mut result.types_used, module, &module.types, source);
                insert_used(&mut result.constants_used, module, &module.constants, source);
            } else {
                let used: BTreeSet<String> = module
                    .identifiers()
                    .filter(|name| source.contains_identifier(name))
                    .cloned()
                    .collect();

                if !used.is_empty() {
                    result.unincluded_usage.insert(module.id.clone(), used);
                }
            }
        }

        result
    }

    /// @ai:intent Match raw source text against the catalog
    /// @ai:effects pure
    fn match_source(&self, text: &str, catalog: &ModuleCatalog) -> MatchResult {
        self.match_lexed(&self.lexer.lex(text), catalog)
    }
}

fn insert_used(
    target: &mut BTreeMap<String, BTreeSet<String>>,
    module: &ModuleDefinition,
    names: &BTreeSet<String>,
    source: &LexedSource,
) {
    let used: BTreeSet<String> = names
        .iter()
        .filter(|name| source.contains_identifier(name))
        .cloned()
        .collect();

    if !used.is_empty() {
        target.insert(module.id.clone(), used);
    }
}
