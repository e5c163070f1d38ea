//! Placeholder substitution over a document's text units.

use crate::document::TextTree;
use crate::naming::VariableMapping;
use log::debug;

/// Replaces every mapped placeholder with `{{ variable_name }}` syntax.
///
/// Longer placeholders are replaced first so that one placeholder embedded
/// in another (for example `{AMOUNT}` inside `${AMOUNT}`) never clobbers the
/// longer form. Ties keep the mapping's order. Placeholders are matched as
/// literal text, no pattern interpretation.
///
/// Returns the number of text units whose final text differs from their
/// original text. Units are rewritten in order, so an interrupted run leaves
/// every earlier unit converted.
pub fn apply_mapping<T: TextTree + ?Sized>(tree: &mut T, mapping: &VariableMapping) -> usize {
    let mut ordered: Vec<(&str, &str)> = mapping.iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut converted = 0;
    for index in 0..tree.unit_count() {
        let Some(original) = tree.unit_text(index) else {
            continue;
        };
        let original = original.to_string();

        let mut updated = original.clone();
        for (placeholder, variable) in &ordered {
            if updated.contains(placeholder) {
                updated = updated.replace(placeholder, &format!("{{{{ {} }}}}", variable));
                debug!("Converted {} -> {{{{ {} }}}}", placeholder, variable);
            }
        }

        if updated != original {
            tree.set_unit_text(index, updated);
            converted += 1;
        }
    }

    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TemplateDocument;

    fn mapping(pairs: &[(&str, &str)]) -> VariableMapping {
        let mut mapping = VariableMapping::new();
        for (placeholder, variable) in pairs {
            mapping.insert(*placeholder, *variable);
        }
        mapping
    }

    #[test]
    fn replaces_placeholders_with_template_syntax() {
        let mut doc = TemplateDocument::from_text("Tenant: [NAME]\nRent due on ____");
        let count = apply_mapping(&mut doc, &mapping(&[("[NAME]", "tenant_name"), ("____", "due_date")]));

        assert_eq!(count, 2);
        assert_eq!(doc.full_text(), "Tenant: {{ tenant_name }}\nRent due on {{ due_date }}");
    }

    #[test]
    fn longer_placeholders_win_over_their_prefixes() {
        let mut doc = TemplateDocument::from_text("Pay ${AMOUNT} by wire");
        let count = apply_mapping(
            &mut doc,
            &mapping(&[("{AMOUNT}", "curly_amount"), ("${AMOUNT}", "amount")]),
        );

        assert_eq!(count, 1);
        assert_eq!(doc.full_text(), "Pay {{ amount }} by wire");
    }

    #[test]
    fn numbered_markers_never_clobber_longer_ones() {
        let mut doc = TemplateDocument::from_text("Pay #12 now");
        apply_mapping(&mut doc, &mapping(&[("#1", "a"), ("#12", "b")]));

        // A naive #1-first pass would leave "{{ a }}2" behind.
        assert_eq!(doc.full_text(), "Pay {{ b }} now");
    }

    #[test]
    fn placeholders_are_treated_as_literal_text() {
        let mut doc = TemplateDocument::from_text("Total .... due for ${SUM} (see #2)");
        let count = apply_mapping(
            &mut doc,
            &mapping(&[("....", "total"), ("${SUM}", "sum"), ("#2", "clause")]),
        );

        assert_eq!(count, 1);
        assert_eq!(
            doc.full_text(),
            "Total {{ total }} due for {{ sum }} (see {{ clause }})"
        );
    }

    #[test]
    fn counts_units_not_replacements() {
        let mut doc =
            TemplateDocument::from_text("[A] and [B] together\nuntouched line\n| [A] | plain |");
        let count = apply_mapping(&mut doc, &mapping(&[("[A]", "a"), ("[B]", "b")]));

        // Two placeholders in the first paragraph still count once; the
        // table cell counts separately.
        assert_eq!(count, 2);
        assert_eq!(
            doc.full_text(),
            "{{ a }} and {{ b }} together\nuntouched line\n{{ a }}\nplain"
        );
    }

    #[test]
    fn repeated_occurrences_in_one_unit_are_all_replaced() {
        let mut doc = TemplateDocument::from_text("[X] meets [X] and [X]");
        let count = apply_mapping(&mut doc, &mapping(&[("[X]", "x")]));

        assert_eq!(count, 1);
        assert_eq!(doc.full_text(), "{{ x }} meets {{ x }} and {{ x }}");
    }

    #[test]
    fn unmapped_documents_are_left_alone() {
        let mut doc = TemplateDocument::from_text("No placeholders here");
        assert_eq!(apply_mapping(&mut doc, &VariableMapping::new()), 0);
        assert_eq!(doc.full_text(), "No placeholders here");
    }
}
