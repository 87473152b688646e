//! XSD particles and content models
//!
//! A particle is a term (element, wildcard or model group) with occurrence
//! bounds. A [`ContentModel`] matches the sequence of child element names
//! of an instance element against a particle by tracking the set of child
//! positions each sub-particle can end at, which keeps matching polynomial
//! in the number of children.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#Particles

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::elements::ElementRef;
use super::wildcards::Wildcard;
use crate::error::SchemaError;
use crate::namespaces::QName;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// Parse `minOccurs`/`maxOccurs` attribute values
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Result<Self, SchemaError> {
        let min = match min.map(str::trim) {
            None => 1,
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| SchemaError::new(format!("invalid minOccurs value '{}'", v)))?,
        };
        let max = match max.map(str::trim) {
            None => Some(1),
            Some("unbounded") => None,
            Some(v) => Some(
                v.parse::<u32>()
                    .map_err(|_| SchemaError::new(format!("invalid maxOccurs value '{}'", v)))?,
            ),
        };
        if max.is_some_and(|max| max < min) {
            return Err(SchemaError::new(format!(
                "maxOccurs must be greater than or equal to minOccurs ({})",
                min
            )));
        }
        Ok(Self { min, max })
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// The term of a particle
#[derive(Debug, Clone)]
pub enum Term {
    /// An element declaration or reference
    Element(ElementRef),
    /// An element wildcard (`xs:any`)
    Any(Wildcard),
    /// `xs:sequence`
    Sequence(Vec<Particle>),
    /// `xs:choice`
    Choice(Vec<Particle>),
    /// `xs:all`
    All(Vec<Particle>),
}

/// A term with occurrence bounds
#[derive(Debug, Clone)]
pub struct Particle {
    /// What is matched
    pub term: Term,
    /// How often
    pub occurs: Occurs,
}

impl Particle {
    /// Create a particle
    pub fn new(term: Term, occurs: Occurs) -> Self {
        Self { term, occurs }
    }

    /// An empty sequence, the content of types without a model group
    pub fn empty() -> Self {
        Self::new(Term::Sequence(Vec::new()), Occurs::once())
    }

    /// Whether the particle accepts no children at all
    pub fn is_empty(&self) -> bool {
        self.occurs.is_empty()
            || matches!(&self.term, Term::Sequence(ps) | Term::All(ps) if ps.iter().all(Particle::is_empty))
    }

    fn ends(&self, children: &[&QName], starts: &BTreeSet<usize>, furthest: &mut usize) -> BTreeSet<usize> {
        let Occurs { min, max } = self.occurs;
        let mut result = BTreeSet::new();
        if min == 0 {
            result.extend(starts.iter().copied());
        }
        if max == Some(0) {
            return result;
        }

        let mut current = starts.clone();
        let mut seen = starts.clone();
        let mut count: u32 = 0;
        loop {
            count = count.saturating_add(1);
            let next = self.term.ends(children, &current, furthest);
            if next.is_empty() {
                break;
            }
            if count >= min {
                result.extend(next.iter().copied());
            }
            if max.is_some_and(|max| count >= max) {
                break;
            }
            if count >= min {
                // positions already explored cannot lead anywhere new
                let fresh: BTreeSet<usize> = next.difference(&seen).copied().collect();
                if fresh.is_empty() {
                    break;
                }
                seen.extend(fresh.iter().copied());
                current = fresh;
            } else {
                seen.extend(next.iter().copied());
                current = next;
            }
        }
        result
    }
}

impl Term {
    /// Whether a single element or wildcard term accepts a child name
    fn accepts(&self, name: &QName) -> bool {
        match self {
            Term::Element(element) => element.name() == name,
            Term::Any(wildcard) => wildcard.is_namespace_allowed(name.namespace.as_deref()),
            _ => false,
        }
    }

    fn ends(&self, children: &[&QName], starts: &BTreeSet<usize>, furthest: &mut usize) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        match self {
            Term::Element(_) | Term::Any(_) => {
                for &start in starts {
                    if children.get(start).is_some_and(|name| self.accepts(name)) {
                        out.insert(start + 1);
                    }
                }
            }
            Term::Sequence(particles) => {
                let mut current = starts.clone();
                for particle in particles {
                    current = particle.ends(children, &current, furthest);
                    if current.is_empty() {
                        break;
                    }
                }
                out = current;
            }
            Term::Choice(particles) => {
                for particle in particles {
                    out.extend(particle.ends(children, starts, furthest));
                }
            }
            Term::All(members) => {
                for &start in starts {
                    let mut stack = vec![(start, vec![false; members.len()])];
                    while let Some((pos, used)) = stack.pop() {
                        // children consumed so far were accepted even if a required member is missing
                        *furthest = (*furthest).max(pos);
                        let satisfied = members
                            .iter()
                            .zip(&used)
                            .all(|(member, used)| *used || member.occurs.is_emptiable());
                        if satisfied {
                            out.insert(pos);
                        }
                        let Some(name) = children.get(pos) else { continue };
                        let next = members
                            .iter()
                            .enumerate()
                            .find(|(i, member)| !used[*i] && !member.occurs.is_empty() && member.term.accepts(name));
                        if let Some((i, _)) = next {
                            let mut used = used.clone();
                            used[i] = true;
                            stack.push((pos + 1, used));
                        }
                    }
                }
            }
        }
        if let Some(&last) = out.iter().next_back() {
            *furthest = (*furthest).max(last);
        }
        out
    }

    fn collect(&self, elements: &mut IndexMap<QName, ElementRef>, wildcards: &mut Vec<Wildcard>) {
        match self {
            Term::Element(element) => {
                elements
                    .entry(element.name().clone())
                    .or_insert_with(|| element.clone());
            }
            Term::Any(wildcard) => wildcards.push(wildcard.clone()),
            Term::Sequence(ps) | Term::Choice(ps) | Term::All(ps) => {
                for p in ps {
                    p.term.collect(elements, wildcards);
                }
            }
        }
    }
}

/// Why a sequence of children does not match a content model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFailure {
    /// The child at this index cannot be accepted
    Unexpected(usize),
    /// All children were accepted but required content is missing
    Incomplete,
}

/// What a child element matched in a content model
#[derive(Debug, Clone, Copy)]
pub enum ChildMatch<'a> {
    /// An element declaration
    Element(&'a ElementRef),
    /// A wildcard
    Wildcard(&'a Wildcard),
}

/// A particle together with the declarations it contains
#[derive(Debug, Clone)]
pub struct ContentModel {
    particle: Particle,
    elements: IndexMap<QName, ElementRef>,
    wildcards: Vec<Wildcard>,
}

impl ContentModel {
    /// Index the declarations of a particle
    pub fn new(particle: Particle) -> Self {
        let mut elements = IndexMap::new();
        let mut wildcards = Vec::new();
        particle.term.collect(&mut elements, &mut wildcards);
        Self {
            particle,
            elements,
            wildcards,
        }
    }

    /// The model's particle
    pub fn particle(&self) -> &Particle {
        &self.particle
    }

    /// Check a sequence of child element names
    pub fn check(&self, children: &[&QName]) -> Result<(), MatchFailure> {
        let mut furthest = 0;
        let starts = BTreeSet::from([0]);
        let ends = self.particle.ends(children, &starts, &mut furthest);
        if ends.contains(&children.len()) {
            Ok(())
        } else if furthest < children.len() {
            Err(MatchFailure::Unexpected(furthest))
        } else {
            Err(MatchFailure::Incomplete)
        }
    }

    /// The declaration or wildcard a child name is validated with.
    ///
    /// Declarations with the same name inside one content model share a
    /// type, so the name alone determines the declaration.
    pub fn child_match(&self, name: &QName) -> Option<ChildMatch<'_>> {
        if let Some(element) = self.elements.get(name) {
            return Some(ChildMatch::Element(element));
        }
        self.wildcards
            .iter()
            .find(|w| w.is_namespace_allowed(name.namespace.as_deref()))
            .map(ChildMatch::Wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::wildcards::{NamespaceConstraint, ProcessContents};

    fn element(name: &str, occurs: Occurs) -> Particle {
        Particle::new(Term::Element(ElementRef::Global(QName::local(name))), occurs)
    }

    fn names(list: &[&str]) -> Vec<QName> {
        list.iter().map(|n| QName::local(*n)).collect()
    }

    fn check(model: &ContentModel, list: &[&str]) -> Result<(), MatchFailure> {
        let owned = names(list);
        let refs: Vec<&QName> = owned.iter().collect();
        model.check(&refs)
    }

    #[test]
    fn test_occurs_parse() {
        assert_eq!(Occurs::parse(None, None).unwrap(), Occurs::once());
        assert_eq!(Occurs::parse(Some("0"), Some("unbounded")).unwrap(), Occurs::zero_or_more());
        assert!(Occurs::parse(Some("2"), Some("1")).is_err());
        assert!(Occurs::parse(Some("-1"), None).is_err());
    }

    #[test]
    fn test_sequence() {
        let model = ContentModel::new(Particle::new(
            Term::Sequence(vec![
                element("iati-identifier", Occurs::once()),
                element("title", Occurs::optional()),
                element("sector", Occurs::zero_or_more()),
            ]),
            Occurs::once(),
        ));
        assert_eq!(check(&model, &["iati-identifier"]), Ok(()));
        assert_eq!(check(&model, &["iati-identifier", "title", "sector", "sector"]), Ok(()));
        assert_eq!(check(&model, &["iati-identifier", "sector", "title"]), Err(MatchFailure::Unexpected(2)));
        assert_eq!(check(&model, &["title"]), Err(MatchFailure::Unexpected(0)));
        assert_eq!(check(&model, &[]), Err(MatchFailure::Incomplete));
    }

    #[test]
    fn test_unbounded_choice() {
        let model = ContentModel::new(Particle::new(
            Term::Choice(vec![element("a", Occurs::once()), element("b", Occurs::once())]),
            Occurs::new(1, None),
        ));
        assert_eq!(check(&model, &["a", "b", "b", "a"]), Ok(()));
        assert_eq!(check(&model, &[]), Err(MatchFailure::Incomplete));
        assert_eq!(check(&model, &["a", "c"]), Err(MatchFailure::Unexpected(1)));
    }

    #[test]
    fn test_bounded_repetition() {
        let model = ContentModel::new(element("narrative", Occurs::new(2, Some(3))));
        assert_eq!(check(&model, &["narrative"]), Err(MatchFailure::Incomplete));
        assert_eq!(check(&model, &["narrative", "narrative"]), Ok(()));
        assert_eq!(check(&model, &["narrative"; 4]), Err(MatchFailure::Unexpected(3)));
    }

    #[test]
    fn test_all_group() {
        let model = ContentModel::new(Particle::new(
            Term::All(vec![element("x", Occurs::once()), element("y", Occurs::optional())]),
            Occurs::once(),
        ));
        assert_eq!(check(&model, &["y", "x"]), Ok(()));
        assert_eq!(check(&model, &["x"]), Ok(()));
        assert_eq!(check(&model, &["y"]), Err(MatchFailure::Incomplete));
        assert_eq!(check(&model, &["x", "x"]), Err(MatchFailure::Unexpected(1)));
    }

    #[test]
    fn test_all_group_missing_member_is_incomplete() {
        let model = ContentModel::new(Particle::new(
            Term::All(vec![
                element("x", Occurs::once()),
                element("y", Occurs::once()),
                element("z", Occurs::optional()),
            ]),
            Occurs::once(),
        ));
        assert_eq!(check(&model, &["z", "y"]), Err(MatchFailure::Incomplete));
        assert_eq!(check(&model, &[]), Err(MatchFailure::Incomplete));
        assert_eq!(check(&model, &["y", "w"]), Err(MatchFailure::Unexpected(1)));
    }

    #[test]
    fn test_nested_optional_sequences() {
        let inner = Particle::new(
            Term::Sequence(vec![element("a", Occurs::optional()), element("b", Occurs::optional())]),
            Occurs::zero_or_more(),
        );
        let model = ContentModel::new(Particle::new(
            Term::Sequence(vec![inner, element("c", Occurs::once())]),
            Occurs::once(),
        ));
        assert_eq!(check(&model, &["c"]), Ok(()));
        assert_eq!(check(&model, &["a", "b", "b", "a", "c"]), Ok(()));
        assert_eq!(check(&model, &["a", "b"]), Err(MatchFailure::Incomplete));
    }

    #[test]
    fn test_wildcard_child_match() {
        let any = Wildcard::new(
            NamespaceConstraint::Other { target_namespace: None },
            ProcessContents::Lax,
        );
        let model = ContentModel::new(Particle::new(
            Term::Sequence(vec![
                element("title", Occurs::once()),
                Particle::new(Term::Any(any), Occurs::zero_or_more()),
            ]),
            Occurs::once(),
        ));
        let ext = QName::namespaced("urn:ext", "note");
        let title = QName::local("title");
        assert_eq!(model.check(&[&title, &ext, &ext]), Ok(()));
        assert_eq!(model.check(&[&title, &title]), Err(MatchFailure::Unexpected(1)));

        assert!(matches!(model.child_match(&title), Some(ChildMatch::Element(_))));
        assert!(matches!(model.child_match(&ext), Some(ChildMatch::Wildcard(_))));
        assert!(model.child_match(&QName::local("other")).is_none());
    }

    #[test]
    fn test_many_children() {
        let model = ContentModel::new(element("iati-activity", Occurs::zero_or_more()));
        let list = vec!["iati-activity"; 5000];
        assert_eq!(check(&model, &list), Ok(()));
    }
}
