use std::{collections::HashMap, fs::File, io::Read, path::Path};

use anyhow::{bail, ensure, Context, Result};

/// テーマ名(小文字) -> 画像URL
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct ThemeMap {
    images: HashMap<String, String>,
}

impl ThemeMap {
    pub fn open(path: &Path) -> Result<ThemeMap> {
        let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
        ThemeMap::from_reader(file).with_context(|| format!("Failed to load {path:?}"))
    }

    /// 1行目はヘッダとして読み飛ばす
    pub fn from_reader(mut reader: impl Read) -> Result<ThemeMap> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("Failed to read as UTF-8")?;
        // csv は空行を黙って飛ばすので先に見ておく
        if let Some(line) = find_blank_line(&text) {
            bail!("line {line}: expected 2 values (theme, image url), got 0");
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(text.as_bytes());
        let headers = reader.headers().context("Failed to read header")?;
        ensure!(!headers.is_empty(), "missing header row");

        let mut images = HashMap::new();
        for record in reader.records() {
            let record = record.context("Failed to read row")?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            ensure!(
                record.len() == 2,
                "line {line}: expected 2 values (theme, image url), got {}",
                record.len()
            );
            // 後に出てきた行で上書き
            images.insert(record[0].trim().to_lowercase(), record[1].trim().to_string());
        }
        Ok(ThemeMap { images })
    }

    /// 小文字化のみ、trim はしない
    pub fn lookup(&self, theme: &str) -> Option<&str> {
        self.images.get(&theme.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[cfg(test)]
    fn as_map(&self) -> &HashMap<String, String> {
        &self.images
    }
}

/// 引用符の外にある空行の行番号
fn find_blank_line(text: &str) -> Option<usize> {
    let mut line = 1;
    let mut in_quotes = false;
    let mut empty = true;
    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                empty = false;
            }
            '\n' if in_quotes => line += 1,
            '\n' => {
                if empty {
                    return Some(line);
                }
                line += 1;
                empty = true;
            }
            '\r' => {}
            _ => empty = false,
        }
    }
    None
}
