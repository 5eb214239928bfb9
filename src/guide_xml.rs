use std::path::Path;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use crate::error::{EpgError, Result};

/// Minimal owned XML tree, enough to answer the lookups the guide needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant along a `a/b` path; every `a` is tried, not only the first.
    pub fn find(&self, path: &str) -> Option<&Element> {
        match path.split_once('/') {
            None => self.children_named(path).next(),
            Some((head, rest)) => self.children_named(head).find_map(|c| c.find(rest)),
        }
    }

    pub fn find_text(&self, path: &str) -> Option<&str> { self.find(path).map(|e| e.text.as_str()) }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub id: String,
    pub display_name: String,
    pub icon_src: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Programme {
    pub channel: String,
    pub start: String,
    pub stop: String,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub rating: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Guide {
    pub channels: Vec<Channel>,
    pub programmes: Vec<Programme>,
}

pub fn load_guide(path: &Path) -> Result<Guide> {
    let xml = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EpgError::GuideNotFound(path.to_path_buf()),
        _ => EpgError::ReadGuide { path: path.to_path_buf(), source: e },
    })?;
    let guide = parse_guide(&xml)?;
    log::info!("Loaded {} channels and {} programmes from {}", guide.channels.len(), guide.programmes.len(), path.display());
    Ok(guide)
}

pub fn parse_guide(xml: &str) -> Result<Guide> {
    let root = parse_document(xml)?;
    let mut guide = Guide::default();
    for (i, el) in root.children_named("channel").enumerate() {
        let index = i + 1;
        let id = el.attr("id").ok_or(EpgError::MissingField { element: "channel", index, what: "attribute 'id'" })?;
        let display_name = el.find_text("display-name").ok_or(EpgError::MissingField { element: "channel", index, what: "display-name" })?;
        let icon_src = el.find("icon").and_then(|i| i.attr("src")).map(str::to_string);
        guide.channels.push(Channel { id: id.to_string(), display_name: display_name.to_string(), icon_src });
    }
    for (i, el) in root.children_named("programme").enumerate() {
        let index = i + 1;
        let attr = |what: &'static str, key: &str| el.attr(key).map(str::to_string).ok_or(EpgError::MissingField { element: "programme", index, what });
        guide.programmes.push(Programme {
            channel: attr("attribute 'channel'", "channel")?,
            start: attr("attribute 'start'", "start")?,
            stop: attr("attribute 'stop'", "stop")?,
            title: el.find_text("title").map(str::to_string),
            desc: el.find_text("desc").map(str::to_string),
            rating: el.find_text("rating/value").map(str::to_string),
        });
    }
    Ok(guide)
}

pub fn parse_document(xml: &str) -> Result<Element> {
    // Text is kept untrimmed; whitespace between elements only reaches container text.
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        let ev = reader.read_event().map_err(|e| EpgError::MalformedXml { position: reader.error_position() as u64, source: e })?;
        match ev {
            XmlEvent::Start(e) => stack.push(open_element(&e, reader.buffer_position() as u64)?),
            XmlEvent::Empty(e) => { let el = open_element(&e, reader.buffer_position() as u64)?; attach(&mut stack, &mut root, el)?; }
            XmlEvent::End(_) => {
                let el = stack.pop().ok_or_else(|| EpgError::BadStructure("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, el)?;
            }
            // Only text before the first child counts, comments do not split it.
            XmlEvent::Text(t) => {
                if let Some(cur) = stack.last_mut() && cur.children.is_empty() {
                    let v = t.unescape().map_err(|e| EpgError::MalformedXml { position: reader.buffer_position() as u64, source: e })?;
                    cur.text.push_str(&v);
                }
            }
            XmlEvent::CData(c) => {
                if let Some(cur) = stack.last_mut() && cur.children.is_empty() { cur.text.push_str(&String::from_utf8_lossy(&c)); }
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }
    if let Some(open) = stack.last() { return Err(EpgError::BadStructure(format!("unclosed element <{}>", open.name))); }
    root.ok_or_else(|| EpgError::BadStructure("document has no root element".into()))
}

fn open_element(e: &BytesStart, position: u64) -> Result<Element> {
    let mut el = Element { name: String::from_utf8_lossy(e.name().as_ref()).into_owned(), ..Element::default() };
    for a in e.attributes() {
        let a = a.map_err(|err| EpgError::MalformedXml { position, source: err.into() })?;
        let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
        let val = a.unescape_value().map_err(|err| EpgError::MalformedXml { position, source: err })?;
        el.attrs.push((key, val.into_owned()));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
    } else if root.is_some() {
        return Err(EpgError::BadStructure(format!("second root element <{}>", el.name)));
    } else {
        *root = Some(el);
    }
    Ok(())
}
