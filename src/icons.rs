use std::collections::{BTreeMap, HashMap};

/// Channel lineup shipped with the tool. Update when the provider renumbers channels.
const BUILTIN_ICONS: &[(&str, &str)] = &[
    ("1101", "TAO.jpg"),
    ("1102", "RTE2.png"),
    ("1103", "VM1.png"),
    ("1104", "TG4.jpg"),
    ("1105", "RTEN.png"),
    ("1106", "VM2.png"),
    ("1226", "RTER1.jpg"),
    ("1227", "RTE2FM.png"),
    ("1228", "RTELFM.jpg"),
    ("1229", "RTERNG.jpg"),
    ("1230", "RTER1E.jpg"),
    ("1231", "RTEP.png"),
    ("1232", "RTE2XM.png"),
    ("1233", "RTEJR.jpg"),
    ("1234", "RTEG.jpg"),
    ("2101", "RTE1.jpg"),
    ("2102", "RTE21.png"),
    ("2103", "VM3.png"),
    ("2107", "VM4.png"),
    ("2108", "CHAL.png"),
    ("2111", "RTE11.png"),
    ("2117", "RTEJR.jpg"),
    ("2118", "SKY.png"),
    ("2120", "SAOR.png"),
    ("2130", "2RN.png"),
    ("2241", "RMI.jpg"),
    ("2242", "UCB.jpg"),
];

/// Channel id → icon file name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IconTable {
    files: BTreeMap<String, String>,
}

impl IconTable {
    pub fn builtin() -> Self {
        BUILTIN_ICONS.iter().map(|(id, f)| (id.to_string(), f.to_string())).collect()
    }

    pub fn len(&self) -> usize { self.files.len() }

    /// Entries in `other` win over existing ones.
    pub fn merge(&mut self, other: impl IntoIterator<Item = (String, String)>) {
        self.files.extend(other);
    }

    pub fn resolve(&self, base_dir: &str) -> IconPaths {
        IconPaths(self.files.iter().map(|(id, f)| (id.clone(), join_icon_path(base_dir, f))).collect())
    }
}

impl FromIterator<(String, String)> for IconTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { files: iter.into_iter().collect() }
    }
}

/// Channel id → icon path as written into the page.
#[derive(Clone, Debug, Default)]
pub struct IconPaths(HashMap<String, String>);

impl IconPaths {
    /// Empty for channels without a mapped icon.
    pub fn get(&self, id: &str) -> &str { self.0.get(id).map(String::as_str).unwrap_or("") }

    pub fn contains(&self, id: &str) -> bool { self.0.contains_key(id) }
}

pub fn join_icon_path(base_dir: &str, file: &str) -> String {
    if base_dir.is_empty() { return file.to_string(); }
    if base_dir.ends_with(['/', '\\']) { format!("{}{}", base_dir, file) } else { format!("{}/{}", base_dir, file) }
}
