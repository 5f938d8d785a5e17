//! Renders a queryset into HTML. Every value and header is escaped.

use itertools::Itertools;
use tracing::debug;

use crate::{
    query::{check_field, QueryError, QuerySet},
    utils::{escape_html, title},
    value::FieldValue,
    Record,
};

/// A `<table>` with one column per field of the record type, headed by the
/// title-cased field name, and one row per record.
pub fn table<Q: QuerySet>(qs: &Q) -> String {
    let fields = Q::Item::fields();
    let rows = qs
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| record.field(field).unwrap_or(FieldValue::Null))
                .collect_vec()
        })
        .collect_vec();

    debug!(msg = format!(
        "Rendering table with {} columns and {} rows.",
        fields.len(),
        rows.len()
    ));

    let mut out = String::from("<table>\n\t<thead>\n\t\t<tr>\n");
    for field in fields {
        push_cell(&mut out, 3, "th", &title(field));
    }
    out.push_str("\t\t</tr>\n\t</thead>\n\t<tbody>\n");
    for row in rows {
        out.push_str("\t\t<tr>\n");
        for value in row {
            push_cell(&mut out, 3, "td", &value.to_string());
        }
        out.push_str("\t\t</tr>\n");
    }
    out.push_str("\t</tbody>\n</table>");
    out
}

/// A `<dl>` pairing the `term` field of every record with its `definition`
/// field.
pub fn dl<Q: QuerySet>(qs: &Q, term: &str, definition: &str) -> Result<String, QueryError> {
    check_field::<Q::Item>(term)?;
    check_field::<Q::Item>(definition)?;

    let mut out = String::from("<dl>\n");
    for record in qs.iter() {
        for (tag, field) in [("dt", term), ("dd", definition)] {
            let value = record.field(field).unwrap_or(FieldValue::Null);
            push_cell(&mut out, 1, tag, &value.to_string());
        }
    }
    out.push_str("</dl>");
    Ok(out)
}

fn push_cell(out: &mut String, indent: usize, tag: &str, text: &str) {
    out.push_str(&format!(
        "{}<{tag}>{}</{tag}>\n",
        "\t".repeat(indent),
        escape_html(text)
    ));
}

#[cfg(test)]
mod tests {
    use crate::{
        query::Filter,
        records::Records,
        tests::lib_impls::{people, TestStruct},
    };

    use super::*;

    #[test]
    fn table_renders_every_field() {
        let qs = people().filter(Filter::exact("id", 2));
        assert_eq!(
            table(&qs),
            "<table>\n\
             \t<thead>\n\
             \t\t<tr>\n\
             \t\t\t<th>Id</th>\n\
             \t\t\t<th>Name</th>\n\
             \t\t\t<th>Team</th>\n\
             \t\t\t<th>Age</th>\n\
             \t\t\t<th>Nickname</th>\n\
             \t\t</tr>\n\
             \t</thead>\n\
             \t<tbody>\n\
             \t\t<tr>\n\
             \t\t\t<td>2</td>\n\
             \t\t\t<td>bert</td>\n\
             \t\t\t<td>red</td>\n\
             \t\t\t<td>25</td>\n\
             \t\t\t<td></td>\n\
             \t\t</tr>\n\
             \t</tbody>\n\
             </table>"
        );
    }

    #[test]
    fn empty_table_keeps_headers() {
        let html = table(&Records::<TestStruct>::new(vec![]));
        assert!(html.contains("<th>Nickname</th>"));
        assert!(!html.contains("<td>"));
    }

    #[test]
    fn dl_pairs_terms_with_definitions() {
        let qs = people().slice(0, Some(2));
        assert_eq!(
            dl(&qs, "name", "age").unwrap(),
            "<dl>\n\t<dt>anna</dt>\n\t<dd>30</dd>\n\t<dt>bert</dt>\n\t<dd>25</dd>\n</dl>"
        );
        assert_eq!(
            dl(&qs, "name", "colour").unwrap_err(),
            QueryError::UnknownField(String::from("colour"))
        );
    }

    #[test]
    fn values_are_escaped() {
        let qs = Records::new(vec![TestStruct::new(1, "<b>tom & jerry</b>", "blue", 3)]);
        let html = dl(&qs, "name", "team").unwrap();
        assert!(html.contains("<dt>&lt;b&gt;tom &amp; jerry&lt;/b&gt;</dt>"));
        assert!(table(&qs).contains("<td>&lt;b&gt;tom &amp; jerry&lt;/b&gt;</td>"));
    }
}
