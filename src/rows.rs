use std::collections::HashMap;
use crate::error::{EpgError, Result};
use crate::guide_xml::{Channel, Guide, Programme};
use crate::html::html_escape;
use crate::icons::IconPaths;
use crate::timestamp::EpgTime;

#[derive(Clone, Debug)]
pub struct RowOptions {
    /// Shown in place of a missing title, description or rating.
    pub placeholder: String,
    /// Fail instead of substituting the placeholder.
    pub strict: bool,
    /// Fall back to the guide's own `<icon src>` for channels missing from the icon table.
    pub document_icons: bool,
}

impl Default for RowOptions {
    fn default() -> Self { Self { placeholder: "N/A".to_string(), strict: false, document_icons: false } }
}

pub struct Formatter<'a> {
    channels: HashMap<&'a str, &'a Channel>,
    icons: &'a IconPaths,
    opts: &'a RowOptions,
}

impl<'a> Formatter<'a> {
    pub fn new(guide: &'a Guide, icons: &'a IconPaths, opts: &'a RowOptions) -> Self {
        let mut channels: HashMap<&str, &Channel> = HashMap::new();
        for c in &guide.channels {
            if channels.contains_key(c.id.as_str()) { log::warn!("Duplicate channel id {}; keeping the first", c.id); continue; }
            if !icons.contains(&c.id) { log::debug!("No icon mapped for channel {} ({})", c.id, c.display_name); }
            channels.insert(&c.id, c);
        }
        Self { channels, icons, opts }
    }

    pub fn render_all(&self, programmes: &[Programme]) -> Result<Vec<String>> {
        programmes.iter().enumerate().map(|(i, p)| self.render_row(i + 1, p)).collect()
    }

    /// `index` is the 1-based position of the programme in the guide.
    pub fn render_row(&self, index: usize, p: &Programme) -> Result<String> {
        let ch = self.channels.get(p.channel.as_str()).ok_or_else(|| EpgError::UnknownChannel { index, channel: p.channel.clone() })?;
        let start = self.time(index, p, "start", &p.start)?;
        let stop = self.time(index, p, "stop", &p.stop)?;
        let mut icon = self.icons.get(&ch.id);
        if icon.is_empty() && self.opts.document_icons && let Some(src) = ch.icon_src.as_deref() { icon = src; }
        let title = self.text(index, "title", p.title.as_deref())?;
        let rating = self.text(index, "rating/value", p.rating.as_deref())?;
        let desc = self.text(index, "desc", p.desc.as_deref())?;
        Ok(format!(
            "<tr><td class=\"channel-id\">{}</td><td class=\"channel-lg\"><img src=\"{}\" alt=\"\" class=\"channel-icon\">{}</td><td class=\"start-time\">{}</td><td class=\"stop-time\">{}</td><td class=\"timezone\">{}</td><td class=\"channel-title\">{}</td><td class=\"rating\">{}</td><td>{}</td></tr>\n",
            html_escape(&ch.id),
            html_escape(icon),
            html_escape(&ch.display_name),
            start.format_start(),
            stop.format_stop(),
            html_escape(&start.offset),
            html_escape(title),
            html_escape(rating),
            html_escape(desc),
        ))
    }

    fn time(&self, index: usize, p: &Programme, field: &'static str, raw: &str) -> Result<EpgTime> {
        EpgTime::parse(raw).map_err(|source| EpgError::Timestamp { index, channel: p.channel.clone(), field, value: raw.to_string(), source })
    }

    fn text<'s>(&'s self, index: usize, what: &'static str, v: Option<&'s str>) -> Result<&'s str> {
        match v {
            Some(v) => Ok(v),
            None if self.opts.strict => Err(EpgError::MissingField { element: "programme", index, what }),
            None => {
                log::warn!("Programme #{} has no {}; using '{}'", index, what, self.opts.placeholder);
                Ok(self.opts.placeholder.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide_xml::parse_guide;
    use crate::icons::IconTable;
    use crate::timestamp::TimestampError;

    fn guide(programme: &str) -> Guide {
        parse_guide(&format!("<tv><channel id=\"1101\"><display-name>TAO</display-name><icon src=\"http://x/tao.png\"/></channel><channel id=\"42\"><display-name>Local &lt;1&gt;</display-name><icon src=\"http://x/local.png\"/></channel>{}</tv>", programme)).unwrap()
    }

    fn render(g: &Guide, opts: &RowOptions) -> Result<Vec<String>> {
        let icons = IconTable::builtin().resolve("imgs");
        Formatter::new(g, &icons, opts).render_all(&g.programmes)
    }

    #[test]
    fn renders_full_row() {
        let g = guide("<programme channel=\"1101\" start=\"202401151000+0000\" stop=\"202401151030+0000\"><title>News</title><desc>Daily news</desc><rating><value>G</value></rating></programme>");
        let rows = render(&g, &RowOptions::default()).unwrap();
        assert_eq!(rows, vec![
            "<tr><td class=\"channel-id\">1101</td><td class=\"channel-lg\"><img src=\"imgs/TAO.jpg\" alt=\"\" class=\"channel-icon\">TAO</td><td class=\"start-time\">10:00 2024/01/15</td><td class=\"stop-time\">10:30 2024/01/15 </td><td class=\"timezone\">+0000</td><td class=\"channel-title\">News</td><td class=\"rating\">G</td><td>Daily news</td></tr>\n".to_string()
        ]);
    }

    #[test]
    fn escapes_document_text() {
        let g = guide("<programme channel=\"42\" start=\"202401151000\" stop=\"202401151100\"><title>Tom &amp; Jerry</title><desc>&lt;b&gt;bold&lt;/b&gt; \"quoted\"</desc><rating><value>PG</value></rating></programme>");
        let row = &render(&g, &RowOptions::default()).unwrap()[0];
        assert!(row.contains("<img src=\"\" alt=\"\""));
        assert!(row.contains(">Local &lt;1&gt;</td>"));
        assert!(row.contains(">Tom &amp; Jerry</td>"));
        assert!(row.contains("<td>&lt;b&gt;bold&lt;/b&gt; &quot;quoted&quot;</td>"));
    }

    #[test]
    fn padded_text_reaches_cells_unchanged() {
        let g = parse_guide("<tv><channel id=\"1101\"><display-name> TAO </display-name></channel><programme channel=\"1101\" start=\"202401151000\" stop=\"202401151100\"><title> Film </title><desc>  Late &amp; live <![CDATA[<b>]]> </desc><rating><value>G</value></rating></programme></tv>").unwrap();
        let row = &render(&g, &RowOptions::default()).unwrap()[0];
        assert!(row.contains("class=\"channel-icon\"> TAO </td>"));
        assert!(row.contains("<td class=\"channel-title\"> Film </td>"));
        assert!(row.contains("<td>  Late &amp; live &lt;b&gt; </td></tr>"));
    }

    #[test]
    fn missing_text_uses_placeholder() {
        let g = guide("<programme channel=\"1101\" start=\"202401151000\" stop=\"202401151100\"><title>Only title</title></programme>");
        let opts = RowOptions { placeholder: "-".into(), ..RowOptions::default() };
        let row = &render(&g, &opts).unwrap()[0];
        assert!(row.contains("<td class=\"rating\">-</td><td>-</td>"));
    }

    #[test]
    fn strict_mode_rejects_missing_text() {
        let g = guide("<programme channel=\"1101\" start=\"202401151000\" stop=\"202401151100\"><title>T</title><rating><value>G</value></rating></programme>");
        let err = render(&g, &RowOptions { strict: true, ..RowOptions::default() }).unwrap_err();
        assert!(matches!(err, EpgError::MissingField { what: "desc", index: 1, .. }));
    }

    #[test]
    fn unknown_channel_is_distinct() {
        let g = guide("<programme channel=\"1101\" start=\"202401151000\" stop=\"202401151100\"/><programme channel=\"9999\" start=\"202401151000\" stop=\"202401151100\"/>");
        match render(&g, &RowOptions::default()).unwrap_err() {
            EpgError::UnknownChannel { index, channel } => { assert_eq!(index, 2); assert_eq!(channel, "9999"); }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_timestamp_names_field() {
        let g = guide("<programme channel=\"1101\" start=\"202401151000\" stop=\"2024\"/>");
        match render(&g, &RowOptions::default()).unwrap_err() {
            EpgError::Timestamp { field, value, source, .. } => {
                assert_eq!(field, "stop");
                assert_eq!(value, "2024");
                assert_eq!(source, TimestampError::TooShort(4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn document_icons_fill_unmapped_channels() {
        let g = guide("<programme channel=\"42\" start=\"202401151000\" stop=\"202401151100\"/><programme channel=\"1101\" start=\"202401151000\" stop=\"202401151100\"/>");
        let rows = render(&g, &RowOptions { document_icons: true, ..RowOptions::default() }).unwrap();
        assert!(rows[0].contains("<img src=\"http://x/local.png\""));
        assert!(rows[1].contains("<img src=\"imgs/TAO.jpg\""));
    }

    #[test]
    fn first_duplicate_channel_wins() {
        let g = parse_guide("<tv><channel id=\"7\"><display-name>First</display-name></channel><channel id=\"7\"><display-name>Second</display-name></channel><programme channel=\"7\" start=\"202401151000\" stop=\"202401151100\"/></tv>").unwrap();
        let row = &render(&g, &RowOptions::default()).unwrap()[0];
        assert!(row.contains(">First</td>"));
    }
}
