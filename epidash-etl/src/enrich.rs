//! Enrichment joins
//!
//! Left joins of normalized rows against reference tables. Every input
//! row appears exactly once in the output whether or not it matched;
//! unmatched rows keep the `"N/A"` continent sentinel and an unknown
//! population instead of being dropped.

use std::collections::HashMap;
use std::sync::OnceLock;

use epidash_common::db::models::{LookupRecord, Observation, MISSING};

/// One observation with its reference attributes attached
#[derive(Debug, Clone)]
pub struct EnrichedObservation {
    pub observation: Observation,
    pub iso2: Option<String>,
    pub continent: &'static str,
    pub population: Option<i64>,
}

/// Left join observations against the fetched lookup table.
///
/// Matching is tried on (region, province) first, then on the region's
/// country-level record. Output length always equals input length.
pub fn enrich_observations(
    observations: &[Observation],
    lookup: &[LookupRecord],
) -> Vec<EnrichedObservation> {
    let mut by_key: HashMap<(&str, &str), &LookupRecord> = HashMap::new();
    let mut by_region: HashMap<&str, &LookupRecord> = HashMap::new();
    for record in lookup {
        by_key
            .entry((record.region.as_str(), record.province.as_str()))
            .or_insert(record);
        if record.province == MISSING {
            by_region.entry(record.region.as_str()).or_insert(record);
        }
    }

    observations
        .iter()
        .map(|obs| {
            let matched = by_key
                .get(&(obs.region.as_str(), obs.province.as_str()))
                .or_else(|| by_region.get(obs.region.as_str()))
                .copied();

            match matched {
                Some(record) if !record.iso2.is_empty() => EnrichedObservation {
                    observation: obs.clone(),
                    iso2: Some(record.iso2.clone()),
                    continent: continent_for_iso2(&record.iso2),
                    population: record.population,
                },
                Some(record) => EnrichedObservation {
                    observation: obs.clone(),
                    iso2: None,
                    continent: MISSING,
                    population: record.population,
                },
                None => EnrichedObservation {
                    observation: obs.clone(),
                    iso2: None,
                    continent: MISSING,
                    population: None,
                },
            }
        })
        .collect()
}

/// Continent for an ISO 3166-1 alpha-2 code, `"N/A"` when unrecognized
pub fn continent_for_iso2(code: &str) -> &'static str {
    iso2_index()
        .get(code.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(MISSING)
}

/// Continent for an ISO 3166-1 alpha-3 code, `"N/A"` when unrecognized
pub fn continent_for_iso3(code: &str) -> &'static str {
    iso3_index()
        .get(code.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(MISSING)
}

fn iso2_index() -> &'static HashMap<&'static str, &'static str> {
    static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| {
        CONTINENTS
            .iter()
            .map(|&(iso2, _, continent)| (iso2, continent))
            .collect()
    })
}

fn iso3_index() -> &'static HashMap<&'static str, &'static str> {
    static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| {
        CONTINENTS
            .iter()
            .map(|&(_, iso3, continent)| (iso3, continent))
            .collect()
    })
}

/// Country/continent code reference: (alpha-2, alpha-3, continent)
const CONTINENTS: &[(&str, &str, &str)] = &[
    // Africa
    ("DZ", "DZA", "Africa"),
    ("AO", "AGO", "Africa"),
    ("BJ", "BEN", "Africa"),
    ("BW", "BWA", "Africa"),
    ("BF", "BFA", "Africa"),
    ("BI", "BDI", "Africa"),
    ("CM", "CMR", "Africa"),
    ("CV", "CPV", "Africa"),
    ("CF", "CAF", "Africa"),
    ("TD", "TCD", "Africa"),
    ("KM", "COM", "Africa"),
    ("CG", "COG", "Africa"),
    ("CD", "COD", "Africa"),
    ("CI", "CIV", "Africa"),
    ("DJ", "DJI", "Africa"),
    ("EG", "EGY", "Africa"),
    ("GQ", "GNQ", "Africa"),
    ("ER", "ERI", "Africa"),
    ("SZ", "SWZ", "Africa"),
    ("ET", "ETH", "Africa"),
    ("GA", "GAB", "Africa"),
    ("GM", "GMB", "Africa"),
    ("GH", "GHA", "Africa"),
    ("GN", "GIN", "Africa"),
    ("GW", "GNB", "Africa"),
    ("KE", "KEN", "Africa"),
    ("LS", "LSO", "Africa"),
    ("LR", "LBR", "Africa"),
    ("LY", "LBY", "Africa"),
    ("MG", "MDG", "Africa"),
    ("MW", "MWI", "Africa"),
    ("ML", "MLI", "Africa"),
    ("MR", "MRT", "Africa"),
    ("MU", "MUS", "Africa"),
    ("MA", "MAR", "Africa"),
    ("MZ", "MOZ", "Africa"),
    ("NA", "NAM", "Africa"),
    ("NE", "NER", "Africa"),
    ("NG", "NGA", "Africa"),
    ("RW", "RWA", "Africa"),
    ("ST", "STP", "Africa"),
    ("SN", "SEN", "Africa"),
    ("SC", "SYC", "Africa"),
    ("SL", "SLE", "Africa"),
    ("SO", "SOM", "Africa"),
    ("ZA", "ZAF", "Africa"),
    ("SS", "SSD", "Africa"),
    ("SD", "SDN", "Africa"),
    ("TZ", "TZA", "Africa"),
    ("TG", "TGO", "Africa"),
    ("TN", "TUN", "Africa"),
    ("UG", "UGA", "Africa"),
    ("EH", "ESH", "Africa"),
    ("ZM", "ZMB", "Africa"),
    ("ZW", "ZWE", "Africa"),
    // Asia
    ("AF", "AFG", "Asia"),
    ("AM", "ARM", "Asia"),
    ("AZ", "AZE", "Asia"),
    ("BH", "BHR", "Asia"),
    ("BD", "BGD", "Asia"),
    ("BT", "BTN", "Asia"),
    ("BN", "BRN", "Asia"),
    ("KH", "KHM", "Asia"),
    ("CN", "CHN", "Asia"),
    ("CY", "CYP", "Asia"),
    ("GE", "GEO", "Asia"),
    ("HK", "HKG", "Asia"),
    ("IN", "IND", "Asia"),
    ("ID", "IDN", "Asia"),
    ("IR", "IRN", "Asia"),
    ("IQ", "IRQ", "Asia"),
    ("IL", "ISR", "Asia"),
    ("JP", "JPN", "Asia"),
    ("JO", "JOR", "Asia"),
    ("KZ", "KAZ", "Asia"),
    ("KW", "KWT", "Asia"),
    ("KG", "KGZ", "Asia"),
    ("LA", "LAO", "Asia"),
    ("LB", "LBN", "Asia"),
    ("MO", "MAC", "Asia"),
    ("MY", "MYS", "Asia"),
    ("MV", "MDV", "Asia"),
    ("MN", "MNG", "Asia"),
    ("MM", "MMR", "Asia"),
    ("NP", "NPL", "Asia"),
    ("KP", "PRK", "Asia"),
    ("OM", "OMN", "Asia"),
    ("PK", "PAK", "Asia"),
    ("PS", "PSE", "Asia"),
    ("PH", "PHL", "Asia"),
    ("QA", "QAT", "Asia"),
    ("SA", "SAU", "Asia"),
    ("SG", "SGP", "Asia"),
    ("KR", "KOR", "Asia"),
    ("LK", "LKA", "Asia"),
    ("SY", "SYR", "Asia"),
    ("TW", "TWN", "Asia"),
    ("TJ", "TJK", "Asia"),
    ("TH", "THA", "Asia"),
    ("TL", "TLS", "Asia"),
    ("TR", "TUR", "Asia"),
    ("TM", "TKM", "Asia"),
    ("AE", "ARE", "Asia"),
    ("UZ", "UZB", "Asia"),
    ("VN", "VNM", "Asia"),
    ("YE", "YEM", "Asia"),
    // Europe
    ("AL", "ALB", "Europe"),
    ("AD", "AND", "Europe"),
    ("AT", "AUT", "Europe"),
    ("BY", "BLR", "Europe"),
    ("BE", "BEL", "Europe"),
    ("BA", "BIH", "Europe"),
    ("BG", "BGR", "Europe"),
    ("HR", "HRV", "Europe"),
    ("CZ", "CZE", "Europe"),
    ("DK", "DNK", "Europe"),
    ("EE", "EST", "Europe"),
    ("FO", "FRO", "Europe"),
    ("FI", "FIN", "Europe"),
    ("FR", "FRA", "Europe"),
    ("DE", "DEU", "Europe"),
    ("GI", "GIB", "Europe"),
    ("GR", "GRC", "Europe"),
    ("GG", "GGY", "Europe"),
    ("HU", "HUN", "Europe"),
    ("IS", "ISL", "Europe"),
    ("IE", "IRL", "Europe"),
    ("IM", "IMN", "Europe"),
    ("IT", "ITA", "Europe"),
    ("JE", "JEY", "Europe"),
    ("XK", "XKX", "Europe"),
    ("LV", "LVA", "Europe"),
    ("LI", "LIE", "Europe"),
    ("LT", "LTU", "Europe"),
    ("LU", "LUX", "Europe"),
    ("MT", "MLT", "Europe"),
    ("MD", "MDA", "Europe"),
    ("MC", "MCO", "Europe"),
    ("ME", "MNE", "Europe"),
    ("NL", "NLD", "Europe"),
    ("MK", "MKD", "Europe"),
    ("NO", "NOR", "Europe"),
    ("PL", "POL", "Europe"),
    ("PT", "PRT", "Europe"),
    ("RO", "ROU", "Europe"),
    ("RU", "RUS", "Europe"),
    ("SM", "SMR", "Europe"),
    ("RS", "SRB", "Europe"),
    ("SK", "SVK", "Europe"),
    ("SI", "SVN", "Europe"),
    ("ES", "ESP", "Europe"),
    ("SE", "SWE", "Europe"),
    ("CH", "CHE", "Europe"),
    ("UA", "UKR", "Europe"),
    ("GB", "GBR", "Europe"),
    ("VA", "VAT", "Europe"),
    // North America
    ("AI", "AIA", "North America"),
    ("AG", "ATG", "North America"),
    ("AW", "ABW", "North America"),
    ("BS", "BHS", "North America"),
    ("BB", "BRB", "North America"),
    ("BZ", "BLZ", "North America"),
    ("BM", "BMU", "North America"),
    ("CA", "CAN", "North America"),
    ("KY", "CYM", "North America"),
    ("CR", "CRI", "North America"),
    ("CU", "CUB", "North America"),
    ("CW", "CUW", "North America"),
    ("DM", "DMA", "North America"),
    ("DO", "DOM", "North America"),
    ("SV", "SLV", "North America"),
    ("GL", "GRL", "North America"),
    ("GD", "GRD", "North America"),
    ("GT", "GTM", "North America"),
    ("HT", "HTI", "North America"),
    ("HN", "HND", "North America"),
    ("JM", "JAM", "North America"),
    ("MX", "MEX", "North America"),
    ("MS", "MSR", "North America"),
    ("NI", "NIC", "North America"),
    ("PA", "PAN", "North America"),
    ("PR", "PRI", "North America"),
    ("KN", "KNA", "North America"),
    ("LC", "LCA", "North America"),
    ("VC", "VCT", "North America"),
    ("SX", "SXM", "North America"),
    ("TT", "TTO", "North America"),
    ("TC", "TCA", "North America"),
    ("US", "USA", "North America"),
    ("VG", "VGB", "North America"),
    // South America
    ("AR", "ARG", "South America"),
    ("BO", "BOL", "South America"),
    ("BR", "BRA", "South America"),
    ("CL", "CHL", "South America"),
    ("CO", "COL", "South America"),
    ("EC", "ECU", "South America"),
    ("FK", "FLK", "South America"),
    ("GF", "GUF", "South America"),
    ("GY", "GUY", "South America"),
    ("PY", "PRY", "South America"),
    ("PE", "PER", "South America"),
    ("SR", "SUR", "South America"),
    ("UY", "URY", "South America"),
    ("VE", "VEN", "South America"),
    // Oceania
    ("AU", "AUS", "Oceania"),
    ("FJ", "FJI", "Oceania"),
    ("PF", "PYF", "Oceania"),
    ("GU", "GUM", "Oceania"),
    ("KI", "KIR", "Oceania"),
    ("MH", "MHL", "Oceania"),
    ("FM", "FSM", "Oceania"),
    ("NR", "NRU", "Oceania"),
    ("NC", "NCL", "Oceania"),
    ("NZ", "NZL", "Oceania"),
    ("PW", "PLW", "Oceania"),
    ("PG", "PNG", "Oceania"),
    ("WS", "WSM", "Oceania"),
    ("SB", "SLB", "Oceania"),
    ("TO", "TON", "Oceania"),
    ("TV", "TUV", "Oceania"),
    ("VU", "VUT", "Oceania"),
    // Antarctica
    ("AQ", "ATA", "Antarctica"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use epidash_common::db::models::Metric;

    fn obs(region: &str, province: &str) -> Observation {
        Observation {
            region: region.to_string(),
            province: province.to_string(),
            lat: 0.0,
            long: 0.0,
            date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            metric: Metric::Cases,
            value: 1,
        }
    }

    fn lookup(region: &str, province: &str, iso2: &str, population: Option<i64>) -> LookupRecord {
        LookupRecord {
            iso2: iso2.to_string(),
            iso3: format!("{}X", iso2),
            region: region.to_string(),
            province: province.to_string(),
            population,
        }
    }

    #[test]
    fn known_codes_resolve() {
        assert_eq!(continent_for_iso2("IT"), "Europe");
        assert_eq!(continent_for_iso2("kr"), "Asia");
        assert_eq!(continent_for_iso3("BRA"), "South America");
    }

    #[test]
    fn unknown_codes_fall_back_to_sentinel() {
        assert_eq!(continent_for_iso2("ZZ"), MISSING);
        assert_eq!(continent_for_iso3("OWID_WRL"), MISSING);
        assert_eq!(continent_for_iso2(""), MISSING);
    }

    #[test]
    fn enrichment_never_drops_rows() {
        let observations = vec![obs("Italy", "N/A"), obs("Atlantis", "N/A")];
        let lookup_rows = vec![lookup("Italy", "N/A", "IT", Some(60_461_826))];

        let enriched = enrich_observations(&observations, &lookup_rows);
        assert_eq!(enriched.len(), observations.len());
        assert_eq!(enriched[0].continent, "Europe");
        assert_eq!(enriched[0].population, Some(60_461_826));
        assert_eq!(enriched[1].continent, MISSING);
        assert_eq!(enriched[1].population, None);
    }

    #[test]
    fn empty_lookup_still_preserves_length() {
        let observations = vec![obs("Italy", "N/A"), obs("Spain", "N/A")];
        let enriched = enrich_observations(&observations, &[]);
        assert_eq!(enriched.len(), 2);
        assert!(enriched.iter().all(|e| e.continent == MISSING));
    }

    #[test]
    fn province_rows_fall_back_to_country_record() {
        let observations = vec![obs("Australia", "New South Wales")];
        let lookup_rows = vec![lookup("Australia", "N/A", "AU", Some(25_000_000))];

        let enriched = enrich_observations(&observations, &lookup_rows);
        assert_eq!(enriched[0].continent, "Oceania");
    }
}
