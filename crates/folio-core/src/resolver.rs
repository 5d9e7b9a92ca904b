//! # Dependency Resolver
//!
//! Orders components so every component is evaluated strictly after the
//! components it references.
//!
//! ## Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Edge A ──► B means "B must be computed before A"                       │
//! │                                                                         │
//! │   TOTAL_AMOUNT ──► TAXABLE ──► GROSS                                    │
//! │        │              │                                                 │
//! │        │              └──────► DISCOUNT ──► GROSS                       │
//! │        ▼                                                                │
//! │       GST ──► TAXABLE                                                   │
//! │                                                                         │
//! │  Order: GROSS, DISCOUNT, TAXABLE, GST, TOTAL_AMOUNT                     │
//! │                                                                         │
//! │  References to split members (CGST) point at the splitting component   │
//! │  (GST). References to external scalars (CTC) add no edge.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//! Definitions and their references are visited in declared order, so the
//! same input always yields the same order. Shuffling the input yields a
//! different but equally valid order.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::ComponentDefinition;
use crate::validation::validate_definition_count;
use crate::RESERVED_SCALARS;

/// DFS marker for each definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// Another definition (index into the definition slice).
    Component(usize),
    /// A member produced by the split of the definition at this index.
    SplitMember(usize),
    /// A caller-supplied scalar.
    External,
}

/// Code lookup shared by the resolver and the definition store.
pub(crate) struct CodeIndex<'a> {
    components: HashMap<&'a str, usize>,
    split_members: HashMap<&'a str, usize>,
    declared_scalars: &'a BTreeSet<String>,
}

impl<'a> CodeIndex<'a> {
    /// Indexes definition codes and split members.
    ///
    /// Fails with `Duplicate` when two definitions or split members share a
    /// code.
    pub(crate) fn build(
        definitions: &'a [ComponentDefinition],
        declared_scalars: &'a BTreeSet<String>,
    ) -> CoreResult<Self> {
        let mut components = HashMap::with_capacity(definitions.len());
        let mut split_members = HashMap::new();

        for (index, def) in definitions.iter().enumerate() {
            if components.insert(def.code.as_str(), index).is_some() {
                return Err(duplicate(&def.code));
            }
        }

        for (index, def) in definitions.iter().enumerate() {
            let Some(split) = &def.split else { continue };
            for member in split.codes() {
                if components.contains_key(member)
                    || split_members.insert(member, index).is_some()
                {
                    return Err(duplicate(member));
                }
            }
        }

        Ok(CodeIndex {
            components,
            split_members,
            declared_scalars,
        })
    }

    /// Resolves a reference made by `component`.
    pub(crate) fn target(&self, component: &str, reference: &str) -> CoreResult<Target> {
        if let Some(&index) = self.components.get(reference) {
            return Ok(Target::Component(index));
        }
        if let Some(&parent) = self.split_members.get(reference) {
            return Ok(Target::SplitMember(parent));
        }
        if is_recognized_scalar(reference, self.declared_scalars) {
            return Ok(Target::External);
        }
        Err(CoreError::UnknownBaseReference {
            component: component.to_string(),
            reference: reference.to_string(),
        })
    }
}

fn duplicate(code: &str) -> CoreError {
    ValidationError::Duplicate {
        field: "code".to_string(),
        value: code.to_string(),
    }
    .into()
}

/// True for reserved pseudo-components and scalars a definition set declares.
pub fn is_recognized_scalar(name: &str, declared_scalars: &BTreeSet<String>) -> bool {
    RESERVED_SCALARS.contains(&name) || declared_scalars.contains(name)
}

/// Produces an evaluation order for a set of definitions.
///
/// ## Errors
/// - `CyclicDependency` with the cycle's members in traversal order
/// - `UnknownBaseReference` for a reference that is neither a definition,
///   a split member, nor a recognized scalar
/// - `Validation(Duplicate)` for repeated codes
/// - `Validation(TooMany)` for more than `MAX_DEFINITIONS` definitions
///
/// ## Example
/// ```rust
/// use std::collections::BTreeSet;
/// use folio_core::resolver::resolve_order;
/// use folio_core::types::{ComponentDefinition, ComponentKind, Rate};
///
/// let defs = vec![
///     ComponentDefinition::percentage("HRA", ComponentKind::Earning, Rate::Fixed(40.0), "BASIC"),
///     ComponentDefinition::percentage("BASIC", ComponentKind::Earning, Rate::Fixed(50.0), "CTC"),
/// ];
/// let order = resolve_order(&defs, &BTreeSet::new()).unwrap();
/// assert_eq!(order, vec!["BASIC", "HRA"]);
/// ```
pub fn resolve_order(
    definitions: &[ComponentDefinition],
    declared_scalars: &BTreeSet<String>,
) -> CoreResult<Vec<String>> {
    validate_definition_count(definitions.len())?;
    let index = CodeIndex::build(definitions, declared_scalars)?;

    // Adjacency list: edges[a] = definitions that must precede a
    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(definitions.len());
    for def in definitions {
        let mut deps = Vec::new();
        for reference in def.calculation.references() {
            match index.target(&def.code, reference)? {
                Target::Component(dep) | Target::SplitMember(dep) => deps.push(dep),
                Target::External => {}
            }
        }
        edges.push(deps);
    }

    let mut marks = vec![Mark::Unvisited; definitions.len()];
    let mut path = Vec::new();
    let mut order = Vec::with_capacity(definitions.len());

    for start in 0..definitions.len() {
        visit(start, &edges, &mut marks, &mut path, &mut order)
            .map_err(|cycle| CoreError::CyclicDependency {
                cycle: cycle
                    .into_iter()
                    .map(|i| definitions[i].code.clone())
                    .collect(),
            })?;
    }

    let codes: Vec<String> = order
        .into_iter()
        .map(|i| definitions[i].code.clone())
        .collect();
    debug!(order = ?codes, "Resolved component evaluation order");
    Ok(codes)
}

/// Depth-first visit. On a back edge returns the cycle as definition indices.
fn visit(
    node: usize,
    edges: &[Vec<usize>],
    marks: &mut [Mark],
    path: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<(), Vec<usize>> {
    match marks[node] {
        Mark::Visited => return Ok(()),
        Mark::Visiting => {
            let start = path.iter().position(|&n| n == node).unwrap_or(0);
            return Err(path[start..].to_vec());
        }
        Mark::Unvisited => {}
    }

    marks[node] = Mark::Visiting;
    path.push(node);
    for &dep in &edges[node] {
        visit(dep, edges, marks, path, order)?;
    }
    path.pop();
    marks[node] = Mark::Visited;
    order.push(node);
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentKind, LineField, Rate};

    fn pct(code: &str, rate: f64, base: &str) -> ComponentDefinition {
        ComponentDefinition::percentage(code, ComponentKind::Earning, Rate::Fixed(rate), base)
    }

    fn position(order: &[String], code: &str) -> usize {
        order.iter().position(|c| c == code).unwrap()
    }

    #[test]
    fn test_orders_chain_regardless_of_declaration() {
        let defs = vec![
            pct("C", 10.0, "B"),
            pct("B", 10.0, "A"),
            ComponentDefinition::flat("A", ComponentKind::Charge, 100.0),
        ];
        let order = resolve_order(&defs, &BTreeSet::new()).unwrap();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    fn chain(len: usize) -> Vec<ComponentDefinition> {
        // Declared last-first so the walk descends the whole chain
        (0..len)
            .rev()
            .map(|i| match i {
                0 => pct("C0", 10.0, "CTC"),
                _ => pct(&format!("C{i}"), 10.0, &format!("C{}", i - 1)),
            })
            .collect()
    }

    #[test]
    fn test_long_chain_within_limit() {
        let order = resolve_order(&chain(crate::MAX_DEFINITIONS), &BTreeSet::new()).unwrap();
        assert_eq!(order.len(), crate::MAX_DEFINITIONS);
        assert_eq!(order[0], "C0");
    }

    #[test]
    fn test_too_many_definitions_rejected() {
        let defs = chain(crate::MAX_DEFINITIONS + 1);
        let err = resolve_order(&defs, &BTreeSet::new()).unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::TooMany {
                field: "definitions".to_string(),
                max: crate::MAX_DEFINITIONS,
            })
        );
    }

    #[test]
    fn test_two_node_cycle() {
        let defs = vec![pct("A", 50.0, "B"), pct("B", 50.0, "A")];
        let err = resolve_order(&defs, &BTreeSet::new()).unwrap_err();
        assert_eq!(
            err,
            CoreError::CyclicDependency {
                cycle: vec!["A".to_string(), "B".to_string()]
            }
        );
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let defs = vec![pct("A", 50.0, "A")];
        let err = resolve_order(&defs, &BTreeSet::new()).unwrap_err();
        assert_eq!(
            err,
            CoreError::CyclicDependency {
                cycle: vec!["A".to_string()]
            }
        );
    }

    #[test]
    fn test_cycle_reported_without_acyclic_prefix() {
        // X depends on the A <-> B cycle but is not part of it
        let defs = vec![pct("X", 10.0, "A"), pct("A", 50.0, "B"), pct("B", 50.0, "A")];
        let err = resolve_order(&defs, &BTreeSet::new()).unwrap_err();
        assert_eq!(
            err,
            CoreError::CyclicDependency {
                cycle: vec!["A".to_string(), "B".to_string()]
            }
        );
    }

    #[test]
    fn test_unknown_reference() {
        let defs = vec![pct("HRA", 40.0, "BASICC")];
        let err = resolve_order(&defs, &BTreeSet::new()).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownBaseReference {
                component: "HRA".to_string(),
                reference: "BASICC".to_string()
            }
        );
    }

    #[test]
    fn test_reserved_and_declared_scalars_are_external() {
        let defs = vec![pct("BASIC", 50.0, "CTC"), pct("EMI_INT", 1.0, "PRINCIPAL")];
        assert!(resolve_order(&defs, &BTreeSet::new()).is_err());

        let declared: BTreeSet<String> = ["PRINCIPAL".to_string()].into();
        let order = resolve_order(&defs, &declared).unwrap();
        assert_eq!(order, vec!["BASIC", "EMI_INT"]);
    }

    #[test]
    fn test_split_member_reference_orders_after_parent() {
        let defs = vec![
            ComponentDefinition::sum("STATE_TAX", ComponentKind::Total, &["SGST"], &[]),
            ComponentDefinition::percentage(
                "GST",
                ComponentKind::Tax,
                Rate::Line(LineField::RateValue),
                "TAXABLE",
            )
            .with_split(&["CGST", "SGST"], Some("IGST")),
        ];
        let order = resolve_order(&defs, &BTreeSet::new()).unwrap();
        assert!(position(&order, "GST") < position(&order, "STATE_TAX"));
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let defs = vec![
            ComponentDefinition::flat("A", ComponentKind::Charge, 1.0),
            ComponentDefinition::flat("A", ComponentKind::Charge, 2.0),
        ];
        let err = resolve_order(&defs, &BTreeSet::new()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_split_member_clashing_with_definition_rejected() {
        let defs = vec![
            ComponentDefinition::flat("CGST", ComponentKind::Tax, 1.0),
            ComponentDefinition::percentage("GST", ComponentKind::Tax, Rate::Fixed(18.0), "GROSS")
                .with_split(&["CGST", "SGST"], None),
        ];
        assert!(resolve_order(&defs, &BTreeSet::new()).is_err());
    }
}
