// 词表加载
//
// 词表为 TSV：每行 `书写形式<TAB>读法`，单列表示读法与书写相同，空行忽略。
// 构建语法时按路径读取一次，指纹与解析用的是同一份内容。

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{MeasureError, Result};
use crate::fst::Grammar;

/// 一张字面对照表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    entries: Vec<(String, String)>,
}

impl Lexicon {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// 解析 TSV 文本（`origin` 仅用于错误信息）
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let malformed = |reason: &str| MeasureError::LexiconFormat {
                path: origin.to_path_buf(),
                line: idx + 1,
                reason: reason.to_string(),
            };

            let columns: Vec<&str> = line.split('\t').collect();
            let (written, spoken) = match columns.as_slice() {
                [single] => (*single, *single),
                [written, spoken] => (*written, *spoken),
                _ => return Err(malformed("expected one or two tab-separated columns")),
            };
            if written.is_empty() || spoken.is_empty() {
                return Err(malformed("empty column"));
            }

            let entry = (written.to_string(), spoken.to_string());
            if !seen.insert(entry.clone()) {
                tracing::warn!("词表 {:?} 第 {} 行重复，已跳过", origin, idx + 1);
                continue;
            }
            entries.push(entry);
        }

        if entries.is_empty() {
            return Err(MeasureError::Configuration(format!(
                "lexicon {:?} has no entries",
                origin
            )));
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// 交换两列（读法 → 书写形式）
    pub fn inverted(&self) -> Lexicon {
        Lexicon::new(
            self.entries
                .iter()
                .map(|(w, s)| (s.clone(), w.clone()))
                .collect(),
        )
    }

    /// 追加书写变体：结尾句点、首字母大写、首字母大写加句点
    ///
    /// - `dr` -> `doctor` 派生出 `dr.` / `Dr` / `Dr.`
    /// - 读法在首字母大写变体中同样首字母大写
    pub fn with_formats(&self) -> Lexicon {
        let mut entries = self.entries.clone();
        for (written, spoken) in &self.entries {
            let cap_written = capitalize(written);
            let cap_spoken = capitalize(spoken);
            entries.push((format!("{}.", written), spoken.clone()));
            entries.push((cap_written.clone(), cap_spoken.clone()));
            entries.push((format!("{}.", cap_written), cap_spoken));
        }
        dedup_entries(&mut entries);
        Lexicon::new(entries)
    }

    /// 编译为字面映射语法
    pub fn to_grammar(&self) -> Grammar {
        Grammar::string_map(self.entries.iter().map(|(w, s)| (w.as_str(), s.as_str())))
    }

    /// 只接受读法列（输出侧语言）
    pub fn spoken_acceptor(&self) -> Grammar {
        let mut spoken: Vec<&str> = self.entries.iter().map(|(_, s)| s.as_str()).collect();
        spoken.sort_unstable();
        spoken.dedup();
        Grammar::union(spoken.into_iter().map(Grammar::accep))
    }
}

fn read_table(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| MeasureError::LexiconIo {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 去除重复条目，保留首次出现的位置
fn dedup_entries(entries: &mut Vec<(String, String)>) {
    let mut seen = std::collections::HashSet::new();
    entries.retain(|entry| seen.insert(entry.clone()));
}

/// 语法所需的全部词表
#[derive(Debug, Clone)]
pub struct MeasureLexicons {
    /// 单位：`kg` -> `kilogram`
    pub units: Lexicon,
    /// 不规则复数：`foot` -> `feet`
    pub suppletive: Lexicon,
    /// 运算符：`+` -> `plus`
    pub math_operations: Lexicon,
    /// 街道缩写：`Expy` -> `Expressway`
    pub address_words: Lexicon,
    /// 州名：`California` -> `CA`
    pub states: Lexicon,
    /// 所有词表文件内容的 SHA-256 指纹
    pub version: String,
}

/// 词表文件在数据目录中的相对位置
struct LexiconPaths {
    units: PathBuf,
    suppletive: PathBuf,
    math_operations: PathBuf,
    address_words: PathBuf,
    states: PathBuf,
}

impl LexiconPaths {
    fn in_dir(data_dir: &Path) -> Self {
        Self {
            units: data_dir.join("measurements.tsv"),
            suppletive: data_dir.join("suppletive.tsv"),
            math_operations: data_dir.join("math_operations.tsv"),
            address_words: data_dir.join("address").join("address_words.tsv"),
            states: data_dir.join("address").join("states.tsv"),
        }
    }
}

impl MeasureLexicons {
    /// 从数据目录加载全部词表
    ///
    /// 每个文件只读一次：同一份内容既参与指纹计算也用于解析
    pub fn load(data_dir: &Path) -> Result<Self> {
        let paths = LexiconPaths::in_dir(data_dir);
        let mut hasher = Sha256::new();

        let mut load = |path: &Path| -> Result<Lexicon> {
            let content = read_table(path)?;
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(content.as_bytes());
            let lexicon = Lexicon::parse(&content, path)?;
            tracing::debug!("加载词表 {:?}: {} 条", path, lexicon.entries.len());
            Ok(lexicon)
        };

        let units = load(&paths.units)?;
        let suppletive = load(&paths.suppletive)?;
        let math_operations = load(&paths.math_operations)?;
        let address_words = load(&paths.address_words)?;
        let states = load(&paths.states)?;

        let digest = hasher.finalize();
        Ok(Self {
            units,
            suppletive,
            math_operations,
            address_words,
            states,
            version: digest.iter().map(|b| format!("{:02x}", b)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> PathBuf {
        PathBuf::from("inline.tsv")
    }

    #[test]
    fn test_parse_two_and_one_column() {
        let lexicon = Lexicon::parse("kg\tkilogram\n\nm\tmeter\nStreet\n", &origin()).unwrap();
        assert_eq!(
            lexicon.entries(),
            &[
                ("kg".to_string(), "kilogram".to_string()),
                ("m".to_string(), "meter".to_string()),
                ("Street".to_string(), "Street".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_skips_duplicates() {
        let lexicon = Lexicon::parse("kg\tkilogram\nkg\tkilogram\n", &origin()).unwrap();
        assert_eq!(lexicon.entries().len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = Lexicon::parse("kg\tkilogram\na\tb\tc\n", &origin()).unwrap_err();
        assert!(matches!(err, MeasureError::LexiconFormat { line: 2, .. }));
        assert!(err.is_configuration());

        let err = Lexicon::parse("kg\t\n", &origin()).unwrap_err();
        assert!(matches!(err, MeasureError::LexiconFormat { line: 1, .. }));

        let err = Lexicon::parse("\n\n", &origin()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_with_formats() {
        let lexicon = Lexicon::new(vec![("dr".to_string(), "drive".to_string())]).with_formats();
        let written: Vec<&str> = lexicon.entries().iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(written, vec!["dr", "dr.", "Dr", "Dr."]);
        assert_eq!(lexicon.entries()[2].1, "Drive");
    }

    #[test]
    fn test_inverted() {
        let lexicon = Lexicon::new(vec![("California".to_string(), "CA".to_string())]);
        assert_eq!(lexicon.inverted().entries()[0], ("CA".to_string(), "California".to_string()));
    }

    fn write_tables(dir: &Path) -> LexiconPaths {
        let paths = LexiconPaths::in_dir(dir);
        fs::create_dir_all(dir.join("address")).unwrap();
        for path in [
            &paths.units,
            &paths.suppletive,
            &paths.math_operations,
            &paths.address_words,
            &paths.states,
        ] {
            fs::write(path, "a\tb\n").unwrap();
        }
        paths
    }

    #[test]
    fn test_version_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_tables(dir.path());

        let before = MeasureLexicons::load(dir.path()).unwrap();
        assert_eq!(before.version.len(), 64);
        assert_eq!(before.version, MeasureLexicons::load(dir.path()).unwrap().version);

        fs::write(&paths.units, "a\tc\n").unwrap();
        let after = MeasureLexicons::load(dir.path()).unwrap();
        assert_ne!(before.version, after.version);
        assert_eq!(after.units.entries()[0].1, "c");
    }

    #[test]
    fn test_load_reports_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_tables(dir.path());
        fs::remove_file(&paths.states).unwrap();

        let err = MeasureLexicons::load(dir.path()).unwrap_err();
        assert!(matches!(err, MeasureError::LexiconIo { ref path, .. } if *path == paths.states));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_reports_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_tables(dir.path());
        fs::write(&paths.suppletive, "foot\tfeet\n\nman\tmen\textra\n").unwrap();

        let err = MeasureLexicons::load(dir.path()).unwrap_err();
        assert!(matches!(err, MeasureError::LexiconFormat { line: 3, .. }));
    }
}
