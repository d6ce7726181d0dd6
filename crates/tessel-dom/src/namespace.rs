#![forbid(unsafe_code)]

//! Element namespace resolution.
//!
//! A new element inherits the SVG namespace from its context element,
//! except inside the SVG integration points (`foreignObject`, `desc`,
//! `title`) where content is HTML again.

/// Element namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// SVG elements whose children are parsed as HTML.
pub const SVG_INTEGRATION_POINTS: [&str; 3] = ["foreignObject", "desc", "title"];

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

impl Namespace {
    /// Namespace URI.
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Html => HTML_NAMESPACE,
            Self::Svg => SVG_NAMESPACE,
        }
    }
}

/// Whether children of `tag` revert to HTML inside an SVG subtree.
#[inline]
pub fn is_integration_point(tag: &str) -> bool {
    SVG_INTEGRATION_POINTS.contains(&tag)
}

/// Namespace for a new `tag` created under `context` (namespace and tag
/// of the element it will be inserted into).
pub fn namespace_for(tag: &str, context: Option<(Namespace, &str)>) -> Namespace {
    if tag == "svg" {
        return Namespace::Svg;
    }
    match context {
        Some((Namespace::Svg, context_tag)) if !is_integration_point(context_tag) => {
            Namespace::Svg
        }
        _ => Namespace::Html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_root_switches_namespace() {
        assert_eq!(namespace_for("svg", None), Namespace::Svg);
        assert_eq!(namespace_for("svg", Some((Namespace::Html, "div"))), Namespace::Svg);
    }

    #[test]
    fn svg_children_inherit() {
        assert_eq!(namespace_for("circle", Some((Namespace::Svg, "svg"))), Namespace::Svg);
        assert_eq!(namespace_for("g", Some((Namespace::Svg, "g"))), Namespace::Svg);
    }

    #[test]
    fn integration_points_revert_to_html() {
        for point in SVG_INTEGRATION_POINTS {
            assert_eq!(namespace_for("div", Some((Namespace::Svg, point))), Namespace::Html);
        }
    }

    #[test]
    fn html_stays_html() {
        assert_eq!(namespace_for("span", Some((Namespace::Html, "div"))), Namespace::Html);
        assert_eq!(namespace_for("span", None), Namespace::Html);
    }
}
