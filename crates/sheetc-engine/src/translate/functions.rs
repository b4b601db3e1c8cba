//! Excel-name → target-name function catalog
//!
//! Built once behind a `OnceLock` and never mutated afterwards. An
//! unmapped name still translates (to `xl_<lowername>`), but the caller
//! records an unknown-function diagnostic.

use ahash::AHashMap;
use std::sync::OnceLock;

/// Function category, for reporting only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Math,
    Logical,
    Lookup,
    Text,
    Date,
    ConditionalAggregate,
    Financial,
}

/// One catalog entry
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Excel name (uppercase)
    pub name: &'static str,
    /// Target-language callable
    pub target: &'static str,
    pub category: Category,
    /// Needs the live cell store + current sheet at runtime
    pub dynamic: bool,
}

/// The mapping catalog
pub struct FunctionCatalog {
    functions: AHashMap<&'static str, FunctionDef>,
}

static CATALOG: OnceLock<FunctionCatalog> = OnceLock::new();

/// Process-wide catalog instance
pub fn catalog() -> &'static FunctionCatalog {
    CATALOG.get_or_init(FunctionCatalog::new)
}

impl FunctionCatalog {
    fn new() -> Self {
        let mut catalog = Self {
            functions: AHashMap::new(),
        };
        catalog.register_math();
        catalog.register_logical();
        catalog.register_lookup();
        catalog.register_text();
        catalog.register_date();
        catalog.register_conditional_aggregates();
        catalog.register_financial();
        catalog
    }

    /// Look up by Excel name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_uppercase().as_str())
    }

    /// Deterministic target for a name missing from the catalog
    pub fn fallback_target(name: &str) -> String {
        format!("xl_{}", name.to_lowercase())
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register(&mut self, category: Category, entries: &[(&'static str, &'static str)]) {
        for &(name, target) in entries {
            self.functions.insert(
                name,
                FunctionDef {
                    name,
                    target,
                    category,
                    dynamic: false,
                },
            );
        }
    }

    fn register_dynamic(&mut self, category: Category, entries: &[(&'static str, &'static str)]) {
        for &(name, target) in entries {
            self.functions.insert(
                name,
                FunctionDef {
                    name,
                    target,
                    category,
                    dynamic: true,
                },
            );
        }
    }

    fn register_math(&mut self) {
        self.register(
            Category::Math,
            &[
                ("SUM", "xl_sum"),
                ("AVERAGE", "xl_average"),
                ("COUNT", "xl_count"),
                ("COUNTA", "xl_counta"),
                ("MIN", "xl_min"),
                ("MAX", "xl_max"),
                ("ABS", "abs"),
                ("ROUND", "round"),
                ("ROUNDUP", "xl_roundup"),
                ("ROUNDDOWN", "xl_rounddown"),
                ("INT", "int"),
                ("MOD", "xl_mod"),
                ("POWER", "xl_power"),
                ("SQRT", "xl_sqrt"),
                ("LN", "xl_ln"),
                ("LOG", "xl_log"),
                ("LOG10", "xl_log10"),
                ("EXP", "xl_exp"),
                ("CEILING", "xl_ceiling"),
                ("FLOOR", "xl_floor"),
                ("MEDIAN", "xl_median"),
                ("STDEV", "xl_stdev"),
                ("VAR", "xl_var"),
                ("SUMPRODUCT", "xl_sumproduct"),
                ("PI", "xl_pi"),
            ],
        );
    }

    fn register_logical(&mut self) {
        self.register(
            Category::Logical,
            &[
                ("IF", "xl_if"),
                ("AND", "xl_and"),
                ("OR", "xl_or"),
                ("NOT", "xl_not"),
                ("IFERROR", "xl_iferror"),
                ("IFNA", "xl_ifna"),
                ("ISERROR", "xl_iserror"),
                ("ISNA", "xl_isna"),
                ("ISBLANK", "xl_isblank"),
                ("ISNUMBER", "xl_isnumber"),
                ("NA", "xl_na"),
                ("TRUE", "True"),
                ("FALSE", "False"),
            ],
        );
    }

    fn register_lookup(&mut self) {
        self.register(
            Category::Lookup,
            &[
                ("VLOOKUP", "xl_vlookup"),
                ("HLOOKUP", "xl_hlookup"),
                ("INDEX", "xl_index"),
                ("MATCH", "xl_match"),
                ("CHOOSE", "xl_choose"),
                ("LOOKUP", "xl_lookup"),
                ("TRANSPOSE", "xl_transpose"),
                ("ROWS", "xl_rows"),
                ("COLUMNS", "xl_columns"),
            ],
        );
        // These cannot be resolved statically; they compile to shims that
        // receive the cell store and current sheet.
        self.register_dynamic(
            Category::Lookup,
            &[
                ("INDIRECT", "xl_indirect"),
                ("OFFSET", "xl_offset"),
                ("ROW", "xl_row"),
                ("COLUMN", "xl_column"),
            ],
        );
    }

    fn register_text(&mut self) {
        self.register(
            Category::Text,
            &[
                ("LEFT", "xl_left"),
                ("RIGHT", "xl_right"),
                ("MID", "xl_mid"),
                ("LEN", "xl_len"),
                ("TRIM", "xl_trim"),
                ("UPPER", "xl_upper"),
                ("LOWER", "xl_lower"),
                ("CONCATENATE", "xl_concatenate"),
                ("TEXT", "xl_text"),
                ("VALUE", "xl_value"),
                ("FIND", "xl_find"),
                ("SEARCH", "xl_search"),
                ("SUBSTITUTE", "xl_substitute"),
                ("REPLACE", "xl_replace"),
            ],
        );
    }

    fn register_date(&mut self) {
        self.register(
            Category::Date,
            &[
                ("TODAY", "xl_today"),
                ("NOW", "xl_now"),
                ("YEAR", "xl_year"),
                ("MONTH", "xl_month"),
                ("DAY", "xl_day"),
                ("DATE", "xl_date"),
                ("EOMONTH", "xl_eomonth"),
                ("EDATE", "xl_edate"),
                ("DATEDIF", "xl_datedif"),
                ("DAYS", "xl_days"),
            ],
        );
    }

    fn register_conditional_aggregates(&mut self) {
        self.register(
            Category::ConditionalAggregate,
            &[
                ("SUMIF", "xl_sumif"),
                ("SUMIFS", "xl_sumifs"),
                ("COUNTIF", "xl_countif"),
                ("COUNTIFS", "xl_countifs"),
                ("AVERAGEIF", "xl_averageif"),
                ("AVERAGEIFS", "xl_averageifs"),
                ("MAXIFS", "xl_maxifs"),
                ("MINIFS", "xl_minifs"),
                ("LARGE", "xl_large"),
                ("SMALL", "xl_small"),
            ],
        );
    }

    fn register_financial(&mut self) {
        self.register(
            Category::Financial,
            &[
                ("NPV", "xl_npv"),
                ("IRR", "xl_irr"),
                ("XNPV", "xl_xnpv"),
                ("XIRR", "xl_xirr"),
                ("PMT", "xl_pmt"),
                ("PPMT", "xl_ppmt"),
                ("IPMT", "xl_ipmt"),
                ("PV", "xl_pv"),
                ("FV", "xl_fv"),
                ("NPER", "xl_nper"),
                ("RATE", "xl_rate"),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        let c = catalog();
        assert_eq!(c.get("SUM").unwrap().target, "xl_sum");
        assert_eq!(c.get("sum").unwrap().target, "xl_sum");
        assert_eq!(c.get("Vlookup").unwrap().target, "xl_vlookup");
    }

    #[test]
    fn test_dynamic_markers() {
        let c = catalog();
        assert!(c.get("INDIRECT").unwrap().dynamic);
        assert!(c.get("OFFSET").unwrap().dynamic);
        assert!(c.get("ROW").unwrap().dynamic);
        assert!(c.get("COLUMN").unwrap().dynamic);
        assert!(!c.get("SUM").unwrap().dynamic);
        assert!(!c.get("ROWS").unwrap().dynamic);
    }

    #[test]
    fn test_fallback_target() {
        assert_eq!(FunctionCatalog::fallback_target("FOOBAR"), "xl_foobar");
    }

    #[test]
    fn test_categories_present() {
        let c = catalog();
        assert!(c.len() > 80);
        assert_eq!(c.get("PMT").unwrap().category, Category::Financial);
        assert_eq!(c.get("SUMIFS").unwrap().category, Category::ConditionalAggregate);
        assert_eq!(c.get("EOMONTH").unwrap().category, Category::Date);
    }
}
