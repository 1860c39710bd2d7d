//! MathML and SVG adjustment tables.
//!
//! Foreign elements keep their case-sensitive names and attributes even
//! though the tokenizer lowercases everything; these tables restore the
//! canonical forms at insertion time.

use crate::sink::AttrNs;

/// SVG tag names whose canonical form is camelCase. Keys are the lowercased
/// names the tokenizer produces; sorted for binary search.
static SVG_TAG_NAMES: &[(&str, &str)] = &[
    ("altglyph", "altGlyph"),
    ("altglyphdef", "altGlyphDef"),
    ("altglyphitem", "altGlyphItem"),
    ("animatecolor", "animateColor"),
    ("animatemotion", "animateMotion"),
    ("animatetransform", "animateTransform"),
    ("clippath", "clipPath"),
    ("feblend", "feBlend"),
    ("fecolormatrix", "feColorMatrix"),
    ("fecomponenttransfer", "feComponentTransfer"),
    ("fecomposite", "feComposite"),
    ("feconvolvematrix", "feConvolveMatrix"),
    ("fediffuselighting", "feDiffuseLighting"),
    ("fedisplacementmap", "feDisplacementMap"),
    ("fedistantlight", "feDistantLight"),
    ("fedropshadow", "feDropShadow"),
    ("feflood", "feFlood"),
    ("fefunca", "feFuncA"),
    ("fefuncb", "feFuncB"),
    ("fefuncg", "feFuncG"),
    ("fefuncr", "feFuncR"),
    ("fegaussianblur", "feGaussianBlur"),
    ("feimage", "feImage"),
    ("femerge", "feMerge"),
    ("femergenode", "feMergeNode"),
    ("femorphology", "feMorphology"),
    ("feoffset", "feOffset"),
    ("fepointlight", "fePointLight"),
    ("fespecularlighting", "feSpecularLighting"),
    ("fespotlight", "feSpotLight"),
    ("fetile", "feTile"),
    ("feturbulence", "feTurbulence"),
    ("foreignobject", "foreignObject"),
    ("glyphref", "glyphRef"),
    ("lineargradient", "linearGradient"),
    ("radialgradient", "radialGradient"),
    ("textpath", "textPath"),
];

/// SVG attribute names with canonical camelCase forms; sorted by key.
static SVG_ATTRIBUTES: &[(&str, &str)] = &[
    ("attributename", "attributeName"),
    ("attributetype", "attributeType"),
    ("basefrequency", "baseFrequency"),
    ("baseprofile", "baseProfile"),
    ("calcmode", "calcMode"),
    ("clippathunits", "clipPathUnits"),
    ("contentscripttype", "contentScriptType"),
    ("contentstyletype", "contentStyleType"),
    ("diffuseconstant", "diffuseConstant"),
    ("edgemode", "edgeMode"),
    ("externalresourcesrequired", "externalResourcesRequired"),
    ("filterunits", "filterUnits"),
    ("glyphref", "glyphRef"),
    ("gradienttransform", "gradientTransform"),
    ("gradientunits", "gradientUnits"),
    ("kernelmatrix", "kernelMatrix"),
    ("kernelunitlength", "kernelUnitLength"),
    ("keypoints", "keyPoints"),
    ("keysplines", "keySplines"),
    ("keytimes", "keyTimes"),
    ("lengthadjust", "lengthAdjust"),
    ("limitingconeangle", "limitingConeAngle"),
    ("markerheight", "markerHeight"),
    ("markerunits", "markerUnits"),
    ("markerwidth", "markerWidth"),
    ("maskcontentunits", "maskContentUnits"),
    ("maskunits", "maskUnits"),
    ("numoctaves", "numOctaves"),
    ("pathlength", "pathLength"),
    ("patterncontentunits", "patternContentUnits"),
    ("patterntransform", "patternTransform"),
    ("patternunits", "patternUnits"),
    ("pointsatx", "pointsAtX"),
    ("pointsaty", "pointsAtY"),
    ("pointsatz", "pointsAtZ"),
    ("preservealpha", "preserveAlpha"),
    ("preserveaspectratio", "preserveAspectRatio"),
    ("primitiveunits", "primitiveUnits"),
    ("refx", "refX"),
    ("refy", "refY"),
    ("repeatcount", "repeatCount"),
    ("repeatdur", "repeatDur"),
    ("requiredextensions", "requiredExtensions"),
    ("requiredfeatures", "requiredFeatures"),
    ("specularconstant", "specularConstant"),
    ("specularexponent", "specularExponent"),
    ("spreadmethod", "spreadMethod"),
    ("startoffset", "startOffset"),
    ("stddeviation", "stdDeviation"),
    ("stitchtiles", "stitchTiles"),
    ("surfacescale", "surfaceScale"),
    ("systemlanguage", "systemLanguage"),
    ("tablevalues", "tableValues"),
    ("targetx", "targetX"),
    ("targety", "targetY"),
    ("textlength", "textLength"),
    ("viewbox", "viewBox"),
    ("viewtarget", "viewTarget"),
    ("xchannelselector", "xChannelSelector"),
    ("ychannelselector", "yChannelSelector"),
    ("zoomandpan", "zoomAndPan"),
];

/// Namespaced attributes shared by both foreign vocabularies; sorted by key.
/// Values are the canonical (possibly prefixed) name and its namespace.
static FOREIGN_ATTRIBUTES: &[(&str, (&str, AttrNs))] = &[
    ("xlink:actuate", ("xlink:actuate", AttrNs::XLink)),
    ("xlink:arcrole", ("xlink:arcrole", AttrNs::XLink)),
    ("xlink:href", ("xlink:href", AttrNs::XLink)),
    ("xlink:role", ("xlink:role", AttrNs::XLink)),
    ("xlink:show", ("xlink:show", AttrNs::XLink)),
    ("xlink:title", ("xlink:title", AttrNs::XLink)),
    ("xlink:type", ("xlink:type", AttrNs::XLink)),
    ("xml:base", ("xml:base", AttrNs::Xml)),
    ("xml:lang", ("xml:lang", AttrNs::Xml)),
    ("xml:space", ("xml:space", AttrNs::Xml)),
    ("xmlns", ("xmlns", AttrNs::XmlNs)),
    ("xmlns:xlink", ("xmlns:xlink", AttrNs::XmlNs)),
];

/// Canonical SVG tag name for a lowercased one.
pub(crate) fn adjust_svg_tag_name(name: &str) -> Option<&'static str> {
    SVG_TAG_NAMES
        .binary_search_by(|(k, _)| (*k).cmp(name))
        .ok()
        .map(|i| SVG_TAG_NAMES[i].1)
}

/// Canonical SVG attribute name for a lowercased one.
pub(crate) fn adjust_svg_attribute(name: &str) -> Option<&'static str> {
    SVG_ATTRIBUTES
        .binary_search_by(|(k, _)| (*k).cmp(name))
        .ok()
        .map(|i| SVG_ATTRIBUTES[i].1)
}

/// MathML has a single case-sensitive attribute.
pub(crate) fn adjust_mathml_attribute(name: &str) -> Option<&'static str> {
    (name == "definitionurl").then_some("definitionURL")
}

/// Namespace fixup for `xlink:*`, `xml:*`, and `xmlns` attributes.
pub(crate) fn adjust_foreign_attribute(name: &str) -> Option<(&'static str, AttrNs)> {
    FOREIGN_ATTRIBUTES
        .binary_search_by(|(k, _)| (*k).cmp(name))
        .ok()
        .map(|i| FOREIGN_ATTRIBUTES[i].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_sorted() {
        assert!(SVG_TAG_NAMES.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(SVG_ATTRIBUTES.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(FOREIGN_ATTRIBUTES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn representative_adjustments() {
        assert_eq!(adjust_svg_tag_name("foreignobject"), Some("foreignObject"));
        assert_eq!(adjust_svg_tag_name("lineargradient"), Some("linearGradient"));
        assert_eq!(adjust_svg_tag_name("svg"), None);
        assert_eq!(adjust_svg_attribute("viewbox"), Some("viewBox"));
        assert_eq!(adjust_mathml_attribute("definitionurl"), Some("definitionURL"));
        assert_eq!(
            adjust_foreign_attribute("xlink:href"),
            Some(("xlink:href", AttrNs::XLink))
        );
        assert_eq!(adjust_foreign_attribute("href"), None);
    }
}
