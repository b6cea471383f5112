//! Style graph pruning.
//!
//! Style definitions reference each other through `w:basedOn`, `w:link` and
//! `w:next`. A style survives pruning when it is reachable along those edges from
//! a style the content uses or from a default style of its type.

use super::{read_xml, write_xml};
use crate::common::xml::{XmlDocument, XmlElement};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::part_name;
use crate::ooxml::opc::{Package, PackURI};
use fixedbitset::FixedBitSet;
use log::debug;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet, VecDeque};

/// Elements whose `w:val` names a style, wherever they occur in content parts.
///
/// `numStyleLink`/`styleLink` come from numbering definitions,
/// `clickAndTypeStyle`/`defaultTableStyle` from the document settings.
const STYLE_REFERENCE_ELEMENTS: [&str; 7] = [
    "pStyle",
    "rStyle",
    "tblStyle",
    "numStyleLink",
    "styleLink",
    "clickAndTypeStyle",
    "defaultTableStyle",
];

/// Parts that hold style definitions rather than style references.
const STYLE_DEFINITION_PARTS: [&str; 2] = ["styles.xml", "styleswitheffects.xml"];

#[inline]
fn is_on(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "on"))
}

/// One `w:style` definition, reduced to what the graph needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDefinition {
    /// Style identifier (`w:styleId`)
    pub id: String,
    /// Style type (`paragraph`, `character`, `table`, `numbering`)
    pub style_type: Option<String>,
    /// Whether `w:default` marks this style as the default of its type
    pub is_default: bool,
    /// Parent style (`w:basedOn`)
    pub based_on: Option<String>,
    /// Linked paragraph/character style (`w:link`)
    pub linked: Option<String>,
    /// Style applied to the following paragraph (`w:next`)
    pub next: Option<String>,
}

impl StyleDefinition {
    /// Read a `w:style` element.
    ///
    /// Returns `None` for elements that are not styles or carry no identifier.
    pub fn from_element(el: &XmlElement) -> Option<Self> {
        if el.local_name() != "style" {
            return None;
        }
        let id = el.attribute_local("styleId")?.into_owned();
        let edge = |local: &str| {
            el.child(local)
                .and_then(|c| c.attribute_local("val"))
                .map(|v| v.into_owned())
        };

        Some(Self {
            style_type: el.attribute_local("type").map(|v| v.into_owned()),
            is_default: is_on(el.attribute_local("default").as_deref()),
            based_on: edge("basedOn"),
            linked: edge("link"),
            next: edge("next"),
            id,
        })
    }

    /// Outgoing edges: `basedOn`, `link`, `next`, in that order.
    pub fn edges(&self) -> SmallVec<[&str; 3]> {
        [&self.based_on, &self.linked, &self.next]
            .into_iter()
            .filter_map(|edge| edge.as_deref())
            .collect()
    }
}

/// Directed graph over the style definitions of a styles part.
#[derive(Debug, Clone, Default)]
pub struct StyleGraph {
    styles: Vec<StyleDefinition>,
    /// First definition of each identifier
    index: HashMap<String, usize>,
}

impl StyleGraph {
    /// Build a graph from definitions. Later duplicates of an identifier share the
    /// fate of the first one.
    pub fn new(styles: Vec<StyleDefinition>) -> Self {
        let mut index = HashMap::with_capacity(styles.len());
        for (i, style) in styles.iter().enumerate() {
            index.entry(style.id.clone()).or_insert(i);
        }
        Self { styles, index }
    }

    /// Build a graph from a parsed `word/styles.xml`.
    pub fn from_styles_part(doc: &XmlDocument) -> Self {
        Self::new(doc.root().elements().filter_map(StyleDefinition::from_element).collect())
    }

    pub fn get(&self, id: &str) -> Option<&StyleDefinition> {
        self.index.get(id).map(|&i| &self.styles[i])
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Identifiers of the default styles.
    pub fn defaults(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().filter(|s| s.is_default).map(|s| s.id.as_str())
    }

    /// Every defined style reachable from `seeds`, seeds included.
    ///
    /// Seeds and edges naming undefined styles are ignored. Each style is visited
    /// at most once, so reference cycles terminate.
    pub fn closure<'a, I>(&self, seeds: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut visited = FixedBitSet::with_capacity(self.styles.len());
        let mut queue: VecDeque<usize> = VecDeque::new();

        for seed in seeds {
            if let Some(&i) = self.index.get(seed)
                && !visited.put(i)
            {
                queue.push_back(i);
            }
        }

        while let Some(i) = queue.pop_front() {
            for target in self.styles[i].edges() {
                if let Some(&j) = self.index.get(target)
                    && !visited.put(j)
                {
                    queue.push_back(j);
                }
            }
        }

        visited.ones().map(|i| self.styles[i].id.clone()).collect()
    }
}

/// Add every style identifier referenced in `doc` to `out`.
pub fn collect_style_references(doc: &XmlDocument, out: &mut HashSet<String>) {
    for el in doc
        .root()
        .find_all(|el| STYLE_REFERENCE_ELEMENTS.contains(&el.local_name()))
    {
        if let Some(val) = el.attribute_local("val") {
            out.insert(val.into_owned());
        }
    }
}

fn is_content_part(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if !lower.starts_with(part_name::WORD_DIR) || !lower.ends_with(".xml") {
        return false;
    }
    let filename = PackURI::from_membername(&lower).filename().to_string();
    !STYLE_DEFINITION_PARTS.contains(&filename.as_str())
}

/// Style identifiers referenced by any XML part under `word/` other than the
/// style definition parts.
///
/// # Errors
///
/// Returns [`OoxmlError::MalformedXml`] for the first part that cannot be parsed.
pub fn used_style_ids(package: &Package) -> Result<HashSet<String>> {
    let mut used = HashSet::new();
    for (name, xml) in package.entries_under(part_name::WORD_DIR) {
        if !is_content_part(name) {
            continue;
        }
        let doc = XmlDocument::parse(xml).map_err(|e| OoxmlError::malformed(name, e))?;
        collect_style_references(&doc, &mut used);
    }
    Ok(used)
}

/// Remove the `w:style` children of a styles document whose identifier is not in `keep`.
///
/// Everything else (`w:docDefaults`, `w:latentStyles`, styles without an
/// identifier) is kept. Returns the removed identifiers in document order.
pub fn prune_styles_part(doc: &mut XmlDocument, keep: &HashSet<String>) -> Vec<String> {
    let mut removed = Vec::new();
    doc.root_mut().retain_elements(|el| match StyleDefinition::from_element(el) {
        Some(style) if !keep.contains(&style.id) => {
            removed.push(style.id);
            false
        },
        _ => true,
    });
    removed
}

/// What the style pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePruning {
    /// Style definitions left in place
    pub retained: usize,
    /// Identifiers of the removed definitions
    pub removed: Vec<String>,
}

/// Remove style definitions that neither content nor any default style reaches.
///
/// `word/styles.xml` is rewritten only when at least one definition goes away.
///
/// # Errors
///
/// Returns [`OoxmlError::MalformedXml`] when the styles part or a content part cannot
/// be parsed; the package is then unchanged.
pub fn remove_unused_styles(package: &mut Package) -> Result<StylePruning> {
    let Some(mut doc) = read_xml(package, part_name::STYLES)? else {
        return Ok(StylePruning::default());
    };

    let graph = StyleGraph::from_styles_part(&doc);
    let used = used_style_ids(package)?;
    let seeds = used.iter().map(String::as_str).chain(graph.defaults());
    let keep = graph.closure(seeds);

    let removed = prune_styles_part(&mut doc, &keep);
    let retained = graph.len() - removed.len();
    if !removed.is_empty() {
        write_xml(package, part_name::STYLES, &doc);
        debug!("removed {} unused style(s), {} retained", removed.len(), retained);
    }

    Ok(StylePruning { retained, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::testing::{W_NS, document_xml, minimal_package};
    use proptest::prelude::*;

    fn style(id: &str, based_on: Option<&str>, linked: Option<&str>, next: Option<&str>) -> String {
        let mut xml = format!(r#"<w:style w:type="paragraph" w:styleId="{}">"#, id);
        xml.push_str(&format!(r#"<w:name w:val="{}"/>"#, id));
        for (tag, target) in [("basedOn", based_on), ("next", next), ("link", linked)] {
            if let Some(target) = target {
                xml.push_str(&format!(r#"<w:{} w:val="{}"/>"#, tag, target));
            }
        }
        xml.push_str("</w:style>");
        xml
    }

    fn styles_xml(styles: &[String]) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}"><w:docDefaults><w:rPrDefault/></w:docDefaults><w:latentStyles w:count="1"/><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>{}</w:styles>"#,
            W_NS,
            styles.concat()
        )
        .into_bytes()
    }

    fn package(styles: &[String], used: &[&str]) -> Package {
        let mut pkg = minimal_package(&[]);
        pkg.put("word/document.xml", document_xml(used));
        pkg.put("word/styles.xml", styles_xml(styles));
        pkg
    }

    fn ids(doc: &XmlDocument) -> Vec<String> {
        doc.root()
            .elements()
            .filter_map(StyleDefinition::from_element)
            .map(|s| s.id)
            .collect()
    }

    #[test]
    fn test_definition_edges() {
        let xml = format!(r#"<w:styles xmlns:w="{}">{}</w:styles>"#, W_NS, style("A", Some("B"), Some("C"), None));
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let def = StyleDefinition::from_element(doc.root().child("style").unwrap()).unwrap();
        assert_eq!(def.id, "A");
        assert!(!def.is_default);
        assert_eq!(def.edges().as_slice(), ["B", "C"]);
    }

    #[test]
    fn test_closure_follows_chain_and_keeps_defaults() {
        let mut pkg = package(
            &[
                style("Heading1", Some("Base"), Some("Heading1Char"), Some("Body")),
                style("Base", None, None, None),
                style("Heading1Char", None, None, None),
                style("Body", None, None, None),
                style("Unused", Some("Base"), None, None),
            ],
            &["Heading1"],
        );

        let report = remove_unused_styles(&mut pkg).unwrap();
        assert_eq!(report.removed, ["Unused"]);
        assert_eq!(report.retained, 5);

        let doc = read_xml(&pkg, part_name::STYLES).unwrap().unwrap();
        assert_eq!(ids(&doc), ["Normal", "Heading1", "Base", "Heading1Char", "Body"]);
        assert!(doc.root().child("docDefaults").is_some());
        assert!(doc.root().child("latentStyles").is_some());
    }

    #[test]
    fn test_cycle_terminates() {
        let mut pkg = package(
            &[style("A", Some("B"), None, None), style("B", Some("A"), None, None)],
            &["A"],
        );
        let report = remove_unused_styles(&mut pkg).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.retained, 3);
    }

    #[test]
    fn test_dangling_edge_is_dropped() {
        let graph = StyleGraph::new(vec![StyleDefinition {
            id: "A".into(),
            style_type: None,
            is_default: false,
            based_on: Some("Z".into()),
            linked: None,
            next: None,
        }]);
        let keep = graph.closure(["A", "Missing"]);
        assert_eq!(keep, HashSet::from(["A".to_string()]));
    }

    #[test]
    fn test_unchanged_part_is_not_rewritten() {
        let mut pkg = package(&[style("Used", None, None, None)], &["Used"]);
        let before = pkg.get("word/styles.xml").unwrap().to_vec();

        let report = remove_unused_styles(&mut pkg).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(pkg.get("word/styles.xml").unwrap(), &before[..]);
    }

    #[test]
    fn test_references_from_other_parts() {
        let mut pkg = package(
            &[
                style("HeaderStyle", None, None, None),
                style("TableGrid", None, None, None),
                style("ListStyle", None, None, None),
                style("Dropped", None, None, None),
            ],
            &[],
        );
        pkg.put(
            "word/header1.xml",
            format!(r#"<w:hdr xmlns:w="{}"><w:p><w:pPr><w:pStyle w:val="HeaderStyle"/></w:pPr></w:p></w:hdr>"#, W_NS)
                .into_bytes(),
        );
        pkg.put(
            "word/settings.xml",
            format!(r#"<w:settings xmlns:w="{}"><w:defaultTableStyle w:val="TableGrid"/></w:settings>"#, W_NS)
                .into_bytes(),
        );
        pkg.put(
            "word/numbering.xml",
            format!(r#"<w:numbering xmlns:w="{}"><w:abstractNum w:abstractNumId="0"><w:styleLink w:val="ListStyle"/></w:abstractNum></w:numbering>"#, W_NS)
                .into_bytes(),
        );

        let report = remove_unused_styles(&mut pkg).unwrap();
        assert_eq!(report.removed, ["Dropped"]);
    }

    #[test]
    fn test_malformed_content_part_aborts() {
        let mut pkg = package(&[style("Dropped", None, None, None)], &[]);
        pkg.put("word/footer1.xml", b"<w:ftr><w:p></w:ftr>".to_vec());
        let before = pkg.get("word/styles.xml").unwrap().to_vec();

        let err = remove_unused_styles(&mut pkg).unwrap_err();
        assert!(matches!(err, OoxmlError::MalformedXml { ref part, .. } if part == "word/footer1.xml"));
        assert_eq!(pkg.get("word/styles.xml").unwrap(), &before[..]);
    }

    #[test]
    fn test_no_styles_part() {
        let mut pkg = minimal_package(&[]);
        assert_eq!(remove_unused_styles(&mut pkg).unwrap(), StylePruning::default());
    }

    #[test]
    fn test_pruning_is_idempotent() {
        let mut pkg = package(
            &[style("A", Some("B"), None, None), style("B", None, None, None), style("C", None, None, None)],
            &["A"],
        );
        let first = remove_unused_styles(&mut pkg).unwrap();
        assert_eq!(first.removed, ["C"]);
        let after_first = pkg.get("word/styles.xml").unwrap().to_vec();

        let second = remove_unused_styles(&mut pkg).unwrap();
        assert!(second.removed.is_empty());
        assert_eq!(pkg.get("word/styles.xml").unwrap(), &after_first[..]);
    }

    fn graph_strategy() -> impl Strategy<Value = (Vec<StyleDefinition>, Vec<usize>)> {
        // Edge targets range past the style count to produce dangling references.
        let edge = || prop::option::of(0usize..12);
        let def = (edge(), edge(), edge(), any::<bool>());
        (prop::collection::vec(def, 0..10), prop::collection::vec(0usize..12, 0..4)).prop_map(
            |(defs, seeds)| {
                let name = |i: usize| format!("S{}", i);
                let styles = defs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (based_on, linked, next, is_default))| StyleDefinition {
                        id: name(i),
                        style_type: Some("paragraph".into()),
                        is_default,
                        based_on: based_on.map(name),
                        linked: linked.map(name),
                        next: next.map(name),
                    })
                    .collect();
                (styles, seeds)
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_closure_is_closed_and_idempotent((styles, seeds) in graph_strategy()) {
            let graph = StyleGraph::new(styles);
            let seed_ids: Vec<String> = seeds.iter().map(|i| format!("S{}", i)).collect();
            let keep = graph.closure(seed_ids.iter().map(String::as_str));

            for id in &keep {
                let def = graph.get(id).unwrap();
                for target in def.edges() {
                    if graph.get(target).is_some() {
                        prop_assert!(keep.contains(target), "{} -> {} escaped the closure", id, target);
                    }
                }
            }
            for seed in &seed_ids {
                prop_assert_eq!(keep.contains(seed), graph.get(seed).is_some());
            }

            let again = graph.closure(keep.iter().map(String::as_str));
            prop_assert_eq!(again, keep);
        }
    }
}
