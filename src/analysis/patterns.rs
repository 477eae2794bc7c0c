//! Pattern tables used by the classifier and the crawler.
//!
//! The tables are data: they are normally loaded from the patterns file
//! (see `config.rs`) and fall back to the built-in defaults below.

use serde::{Deserialize, Serialize};

/// Conjunctive rule: `trigger` together with any of `companions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialPattern {
    pub trigger: String,
    pub companions: Vec<String>,
}

/// A single keyword and the weight it contributes when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedKeyword {
    pub keyword: String,
    pub weight: f64,
}

/// Every curated table and domain list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTables {
    /// Conjunctive patterns, checked first.
    pub special: Vec<SpecialPattern>,
    /// Sponsor substrings, checked second. Includes common OCR misreads.
    pub exact: Vec<String>,
    /// Weighted single keywords, summed. Order is the indicator order.
    pub weighted: Vec<WeightedKeyword>,
    /// Sponsor-agency domains; an image URL on one of these is conclusive.
    pub sponsor_domains: Vec<String>,
    /// Hosts serving the blog platform's sticker catalog.
    pub sticker_domains: Vec<String>,
    /// Host prefixes (optionally with a path) never treated as content images.
    pub excluded_image_hosts: Vec<String>,
}

impl Default for PatternTables {
    fn default() -> Self {
        Self {
            special: default_special(),
            exact: strings(&[
                "원고료", "고료", "험단", "소정의", "협찬", "수수료", "슈퍼멤버스", "대세블",
                "대서블", "협잔", "협깐", "[현산", "현찬", "[.싫헐진",
            ]),
            weighted: default_weighted(),
            sponsor_domains: strings(&["cometoplay.kr", "reviewnote.co.kr", "xn--939au0g4vj8sq.net"]),
            sticker_domains: strings(&["storep-phinf.pstatic.net", "post-phinf.pstatic.net"]),
            excluded_image_hosts: strings(&[
                "simg.pstatic.net/static.map",
                "map.pstatic.net",
                "ssl.pstatic.net/static/",
            ]),
        }
    }
}

impl PatternTables {
    /// First sponsor domain found in `url`, if any.
    pub fn sponsor_domain_in(&self, url: &str) -> Option<&str> {
        if url.is_empty() {
            return None;
        }
        self.sponsor_domains
            .iter()
            .find(|domain| url.contains(domain.as_str()))
            .map(|d| d.as_str())
    }

    /// Whether `url` is served from the sticker catalog.
    pub fn is_sticker_url(&self, url: &str) -> bool {
        match host_of(url) {
            Some(host) => self
                .sticker_domains
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
            None => self.sticker_domains.iter().any(|d| url.contains(d.as_str())),
        }
    }

    /// Whether `url` matches one of the excluded host prefixes.
    pub fn is_excluded_image(&self, url: &str) -> bool {
        let bare = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("//");
        self.excluded_image_hosts
            .iter()
            .any(|prefix| bare.starts_with(prefix.as_str()))
    }

    /// Sanity checks run after loading a patterns file.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(k) = self
            .weighted
            .iter()
            .find(|k| !(0.0..=1.0).contains(&k.weight))
        {
            return Err(format!("weight for '{}' must be within [0, 1]", k.keyword));
        }
        if let Some(p) = self.special.iter().find(|p| p.companions.is_empty()) {
            return Err(format!("special pattern '{}' has no companions", p.trigger));
        }
        if self.exact.iter().any(|s| s.is_empty())
            || self.weighted.iter().any(|k| k.keyword.is_empty())
        {
            return Err("empty keyword in pattern tables".to_string());
        }
        Ok(())
    }
}

fn host_of(url: &str) -> Option<String> {
    let parsed = if url.starts_with("//") {
        url::Url::parse(&format!("https:{}", url))
    } else {
        url::Url::parse(url)
    };
    parsed.ok()?.host_str().map(|h| h.to_ascii_lowercase())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_special() -> Vec<SpecialPattern> {
    let pattern = |trigger: &str, companions: &[&str]| SpecialPattern {
        trigger: trigger.to_string(),
        companions: strings(companions),
    };
    vec![
        pattern("업체", &["지원", "원고료", "제공"]),
        pattern("후기", &["지원", "원고료", "제공"]),
        pattern("댓가", &["지원", "원고료", "제공"]),
        pattern("서비스", &["제공", "원고료", "작성"]),
        pattern("광고", &["콘텐츠", "원고료", "포스팅", "게시물"]),
        pattern("로부터", &["업체", "작성", "하였", "받았"]),
    ]
}

fn default_weighted() -> Vec<WeightedKeyword> {
    [
        // sponsorship
        ("체험", 0.5),
        ("지원", 0.3),
        ("무상", 0.4),
        ("무료제공", 0.6),
        ("제품제공", 0.7),
        // paid advertising
        ("광고", 0.1),
        ("광고비", 0.4),
        ("유료", 0.5),
        // provided goods
        ("쿠폰", 0.4),
        ("포인트", 0.4),
        ("식사", 0.2),
        ("이용권", 0.2),
        // disclosure phrasing
        ("작", 0.05),
        ("작성", 0.1),
        ("후기", 0.05),
        ("받아", 0.2),
        ("받고", 0.2),
        ("로부", 0.1),
        ("받았", 0.3),
        ("혜택", 0.2),
        ("솔직", 0.2),
        ("리뷰", 0.3),
        ("포함", 0.2),
        ("포스", 0.1),
        ("업체", 0.45),
        ("제공", 0.4),
        ("선정", 0.4),
        // OCR misreads
        ("팡고", 0.1),
        ("유로", 0.2),
        ("업제", 0.45),
        ("입체", 0.45),
        ("제험", 0.5),
        ("쳐혐", 0.5),
        ("쳐험", 0.5),
        ("스트", 0.1),
        ("스팅", 0.1),
    ]
    .into_iter()
    .map(|(keyword, weight)| WeightedKeyword {
        keyword: keyword.to_string(),
        weight,
    })
    .collect()
}
