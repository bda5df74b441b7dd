//! Report label normalizer.
//!
//! Maps the labels printed on lab reports (or returned by a recognizer) to
//! indicators:
//! - Exact ingestion keys (`plt`, `neut_percent`)
//! - Alias lookup (`PLT`, `Platelets`, `血小板计数`)
//! - Alias tokens inside a longer label (`血小板计数(PLT)`)
//! - Fuzzy match for recognition typos (`Platelts`)
//!
//! Labels that name a related but different analyte (`网织红细胞`,
//! `红细胞分布宽度`) stay unresolved rather than landing on the nearest
//! indicator.

use std::collections::HashMap;

use strsim::jaro_winkler;

use crate::models::Indicator;

/// Minimum Jaro-Winkler similarity for a fuzzy match.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.90;

/// Label fragments marking an analyte the engine does not track. A label
/// carrying one is never fuzzy-matched.
const FOREIGN_ANALYTE_MARKERS: &[&str] = &["网织", "有核", "分布宽度", "rdw", "retic", "nrbc"];

/// Characters separating the parts of a compound label.
const LABEL_SEPARATORS: &[char] = &['(', ')', '（', '）', '[', ']', '*', ',', '，', '/'];

/// Normalizer for report labels.
pub struct Normalizer {
    /// Alias map: lowercase label → indicator
    aliases: HashMap<String, Indicator>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a new normalizer with default mappings.
    pub fn new() -> Self {
        Self {
            aliases: Self::default_aliases(),
        }
    }

    /// Resolve a report label to an indicator.
    pub fn resolve(&self, label: &str) -> Option<Indicator> {
        let cleaned = clean_label(label);
        if cleaned.is_empty() {
            return None;
        }

        if let Some(indicator) = Indicator::from_key(&cleaned) {
            return Some(indicator);
        }
        if let Some(indicator) = self.aliases.get(&cleaned) {
            return Some(*indicator);
        }
        if let Some(indicator) = self.alias_token(&cleaned) {
            return Some(indicator);
        }
        if FOREIGN_ANALYTE_MARKERS.iter().any(|marker| cleaned.contains(marker)) {
            tracing::debug!(label, "label names an untracked analyte");
            return None;
        }

        let fuzzy = self.fuzzy_alias(&cleaned);
        if fuzzy.is_none() {
            tracing::debug!(label, "no indicator for label");
        }
        fuzzy
    }

    /// Resolve a label straight to its ingestion key.
    pub fn resolve_key(&self, label: &str) -> Option<&'static str> {
        self.resolve(label).map(Indicator::key)
    }

    /// Add a custom alias mapping.
    pub fn add_alias(&mut self, alias: &str, indicator: Indicator) {
        self.aliases.insert(clean_label(alias), indicator);
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Longest label token that is itself a key or an alias.
    ///
    /// `血小板计数(PLT)` splits into `血小板计数` and `plt`. A token must match
    /// whole, so `平均血红蛋白含量` never hits `血红蛋白`.
    fn alias_token(&self, label: &str) -> Option<Indicator> {
        label
            .split(|c: char| c.is_whitespace() || LABEL_SEPARATORS.contains(&c))
            .filter(|token| !token.is_empty())
            .filter_map(|token| {
                Indicator::from_key(token)
                    .or_else(|| self.aliases.get(token).copied())
                    .map(|indicator| (token, indicator))
            })
            .max_by(|(a, _), (b, _)| {
                a.chars()
                    .count()
                    .cmp(&b.chars().count())
                    .then_with(|| b.cmp(a))
            })
            .map(|(_, indicator)| indicator)
    }

    /// Most similar alias above the threshold.
    fn fuzzy_alias(&self, label: &str) -> Option<Indicator> {
        self.aliases
            .iter()
            .map(|(alias, indicator)| (jaro_winkler(label, alias), alias, *indicator))
            .filter(|(score, _, _)| *score >= FUZZY_MATCH_THRESHOLD)
            .max_by(|(sa, a, _), (sb, b, _)| sa.total_cmp(sb).then_with(|| b.cmp(a)))
            .map(|(_, _, indicator)| indicator)
    }

    /// Default label mappings.
    fn default_aliases() -> HashMap<String, Indicator> {
        use Indicator::*;

        let table: &[(Indicator, &[&str])] = &[
            (Wbc, &["wbc", "white blood cells", "white blood cell count", "leukocytes", "白细胞", "白细胞计数", "白细胞数"]),
            (NeutPercent, &["neut%", "neu%", "neutrophils %", "neutrophil percentage", "中性粒细胞百分比", "中性粒细胞百分数", "中性粒细胞比率", "中性粒细胞%"]),
            (LymphPercent, &["lymph%", "lym%", "lymphocytes %", "lymphocyte percentage", "淋巴细胞百分比", "淋巴细胞百分数", "淋巴细胞比率", "淋巴细胞%"]),
            (MonoPercent, &["mono%", "mon%", "monocytes %", "monocyte percentage", "单核细胞百分比", "单核细胞百分数", "单核细胞比率", "单核细胞%"]),
            (EosPercent, &["eos%", "eosinophils %", "eosinophil percentage", "嗜酸性粒细胞百分比", "嗜酸性粒细胞百分数", "嗜酸性粒细胞比率", "嗜酸性粒细胞%"]),
            (BasoPercent, &["baso%", "bas%", "basophils %", "basophil percentage", "嗜碱性粒细胞百分比", "嗜碱性粒细胞百分数", "嗜碱性粒细胞比率", "嗜碱性粒细胞%"]),
            (NeutCount, &["neut#", "neu#", "neu", "neutrophils", "neutrophil count", "中性粒细胞", "中性粒细胞计数", "中性粒细胞绝对值", "中性粒细胞数"]),
            (LymphCount, &["lymph#", "lym#", "lym", "lymphocytes", "lymphocyte count", "淋巴细胞", "淋巴细胞计数", "淋巴细胞绝对值", "淋巴细胞数"]),
            (MonoCount, &["mono#", "mon#", "mon", "monocytes", "monocyte count", "单核细胞", "单核细胞计数", "单核细胞绝对值", "单核细胞数"]),
            (EosCount, &["eos#", "eos", "eosinophils", "eosinophil count", "嗜酸性粒细胞", "嗜酸性粒细胞计数", "嗜酸性粒细胞绝对值"]),
            (BasoCount, &["baso#", "bas#", "bas", "basophils", "basophil count", "嗜碱性粒细胞", "嗜碱性粒细胞计数", "嗜碱性粒细胞绝对值"]),
            (Rbc, &["rbc", "red blood cells", "red blood cell count", "erythrocytes", "红细胞", "红细胞计数", "红细胞数"]),
            (Hgb, &["hgb", "hb", "haemoglobin", "hemoglobin", "血红蛋白", "血色素"]),
            (Hct, &["hct", "haematocrit", "hematocrit", "红细胞压积", "红细胞比容"]),
            (Mcv, &["mcv", "mean corpuscular volume", "平均红细胞体积"]),
            (Mch, &["mch", "mean corpuscular hemoglobin", "平均红细胞血红蛋白含量", "平均红细胞血红蛋白量", "平均血红蛋白含量", "平均血红蛋白量"]),
            (Mchc, &["mchc", "mean corpuscular hemoglobin concentration", "平均红细胞血红蛋白浓度", "平均血红蛋白浓度"]),
            (Plt, &["plt", "platelets", "platelet count", "thrombocytes", "血小板", "血小板计数", "血小板数"]),
            (Mpv, &["mpv", "mean platelet volume", "平均血小板体积"]),
            (Pdw, &["pdw", "platelet distribution width", "血小板分布宽度"]),
            (Pct, &["pct", "plateletcrit", "血小板压积", "血小板比容"]),
            (PLcr, &["p-lcr", "plcr", "p_lcr", "platelet large cell ratio", "大血小板比率", "大型血小板比率"]),
        ];

        let mut map = HashMap::new();
        for (indicator, aliases) in table {
            for alias in *aliases {
                map.insert((*alias).to_string(), *indicator);
            }
        }
        map
    }
}

/// Lowercase, trim and drop trailing separators such as `:` or `：`.
fn clean_label(label: &str) -> String {
    label
        .trim()
        .trim_end_matches([':', '：'])
        .trim()
        .to_lowercase()
}
