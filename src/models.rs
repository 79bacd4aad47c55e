use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which registry a venue came from. A plain `Venue` is never "both";
/// only a merged pair reports "both" via [`MergedVenue::origin_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Registry A: health-inspection records (row per inspection).
    Inspection,
    /// Registry B: active liquor licenses (row per license).
    Liquor,
}

impl Origin {
    pub fn label(&self) -> &'static str {
        match self {
            Origin::Inspection => "inspection",
            Origin::Liquor => "liquor",
        }
    }
}

/// The five boroughs. `Ord` so grouping keys iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Borough {
    Manhattan,
    Brooklyn,
    Queens,
    Bronx,
    StatenIsland,
}

impl Borough {
    /// Parse a borough from the aliases the two registries actually use:
    /// county names, abbreviations and casing variants.
    pub fn parse(s: &str) -> Option<Borough> {
        let k = s.trim().to_ascii_lowercase();
        match k.as_str() {
            "manhattan" | "new york" | "ny" => Some(Borough::Manhattan),
            "brooklyn" | "bklyn" | "kings" => Some(Borough::Brooklyn),
            "queens" => Some(Borough::Queens),
            "bronx" | "the bronx" => Some(Borough::Bronx),
            "staten island" | "richmond" => Some(Borough::StatenIsland),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Borough::Manhattan => "Manhattan",
            Borough::Brooklyn => "Brooklyn",
            Borough::Queens => "Queens",
            Borough::Bronx => "Bronx",
            Borough::StatenIsland => "Staten Island",
        }
    }
}

/// A venue row as emitted by a source adapter, before validation.
/// Field mapping, pagination and retries are the adapter's problem;
/// the pipeline only sees this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVenueRecord {
    pub source_id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub borough: String,
    /// Building cross-reference id; registry A only.
    #[serde(default)]
    pub building_id: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Descriptive attributes (grade, license type, cuisine). Not used
    /// for matching.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

/// Why a raw record was rejected at intake. Rejects are counted, never
/// fatal; the pipeline is total over its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingSourceId,
    MissingName,
}

/// A validated venue with its derived match keys cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub source_id: String,
    pub origin: Origin,
    pub name: String,
    pub raw_address: String,
    pub normalized_address: String,
    pub normalized_name: String,
    pub borough: Option<Borough>,
    pub building_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tags: Vec<String>,
    pub attrs: BTreeMap<String, String>,
}

impl Venue {
    /// Validate a raw record. Derived keys (normalized address/name,
    /// borough enum) are attached afterwards by the normalization stage.
    pub fn from_raw(raw: RawVenueRecord, origin: Origin) -> Result<Venue, RejectReason> {
        if raw.source_id.trim().is_empty() {
            return Err(RejectReason::MissingSourceId);
        }
        if raw.name.trim().is_empty() {
            return Err(RejectReason::MissingName);
        }
        Ok(Venue {
            source_id: raw.source_id,
            origin,
            name: raw.name,
            raw_address: raw.address,
            normalized_address: String::new(),
            normalized_name: String::new(),
            borough: Borough::parse(&raw.borough),
            building_id: raw.building_id.filter(|b| !b.trim().is_empty()),
            lat: raw.lat,
            lon: raw.lon,
            tags: raw.tags,
            attrs: raw.attrs,
        })
    }

    pub fn has_coords(&self) -> bool {
        matches!((self.lat, self.lon), (Some(la), Some(lo)) if la != 0.0 && lo != 0.0)
    }
}

/// Final output entity: a single venue or a cross-registry pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedVenue {
    /// Base record. For pairs this is the registry-A venue, which carries
    /// the richer attributes (grade, cuisine).
    pub venue: Venue,
    /// The registry-B partner when the entity was merged across sources.
    pub partner: Option<Venue>,
}

impl MergedVenue {
    pub fn standalone(venue: Venue) -> Self {
        MergedVenue {
            venue,
            partner: None,
        }
    }

    /// Join a registry-A and a registry-B venue. Tags are unioned
    /// (first-seen order) and partner attrs folded in without clobbering.
    pub fn paired(a: Venue, b: Venue) -> Self {
        debug_assert_eq!(a.origin, Origin::Inspection);
        debug_assert_eq!(b.origin, Origin::Liquor);
        let mut base = a;
        for t in &b.tags {
            if !base.tags.contains(t) {
                base.tags.push(t.clone());
            }
        }
        for (k, v) in &b.attrs {
            base.attrs.entry(k.clone()).or_insert_with(|| v.clone());
        }
        MergedVenue {
            venue: base,
            partner: Some(b),
        }
    }

    pub fn is_pair(&self) -> bool {
        self.partner.is_some()
    }

    pub fn origin_label(&self) -> &'static str {
        match self.partner {
            Some(_) => "both",
            None => self.venue.origin.label(),
        }
    }

    /// Display names: base name plus the partner's when it differs.
    pub fn names(&self) -> (&str, Option<&str>) {
        let partner = self
            .partner
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| *n != self.venue.name);
        (&self.venue.name, partner)
    }

    pub fn source_ids(&self) -> (&str, Option<&str>) {
        (
            &self.venue.source_id,
            self.partner.as_ref().map(|p| p.source_id.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borough_aliases() {
        assert_eq!(Borough::parse("NEW YORK"), Some(Borough::Manhattan));
        assert_eq!(Borough::parse("Kings"), Some(Borough::Brooklyn));
        assert_eq!(Borough::parse("richmond"), Some(Borough::StatenIsland));
        assert_eq!(Borough::parse("the bronx"), Some(Borough::Bronx));
        assert_eq!(Borough::parse("jersey city"), None);
    }

    #[test]
    fn reject_missing_identifier() {
        let raw = RawVenueRecord {
            source_id: "  ".into(),
            name: "Cafe".into(),
            address: String::new(),
            borough: String::new(),
            building_id: None,
            lat: None,
            lon: None,
            tags: vec![],
            attrs: BTreeMap::new(),
        };
        assert_eq!(
            Venue::from_raw(raw, Origin::Inspection).unwrap_err(),
            RejectReason::MissingSourceId
        );
    }

    #[test]
    fn pair_folds_tags_and_attrs() {
        let mut a = RawVenueRecord {
            source_id: "1".into(),
            name: "Cafe".into(),
            address: "1 MAIN ST".into(),
            borough: "Manhattan".into(),
            building_id: None,
            lat: None,
            lon: None,
            tags: vec!["restaurant".into()],
            attrs: BTreeMap::new(),
        };
        a.attrs.insert("grade".into(), "A".into());
        let mut b = a.clone();
        b.source_id = "9".into();
        b.name = "Cafe LLC".into();
        b.tags = vec!["restaurant".into(), "bar".into()];
        b.attrs.insert("license_type".into(), "On-Premises".into());

        let va = Venue::from_raw(a, Origin::Inspection).unwrap();
        let vb = Venue::from_raw(b, Origin::Liquor).unwrap();
        let m = MergedVenue::paired(va, vb);
        assert_eq!(m.origin_label(), "both");
        assert_eq!(m.venue.tags, vec!["restaurant", "bar"]);
        assert_eq!(m.venue.attrs.get("grade").map(String::as_str), Some("A"));
        assert_eq!(
            m.venue.attrs.get("license_type").map(String::as_str),
            Some("On-Premises")
        );
        assert_eq!(m.names(), ("Cafe", Some("Cafe LLC")));
    }
}
