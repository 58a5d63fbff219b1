use chrono::Utc;
use skychart_cache::{AnalysisCache, ManualClock};
use skychart_core::{
    AnalysisMetadata, AnalysisResult, ChartSubject, LifeMission, NatalChart, PlanetPosition,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn analysis(name: &str) -> AnalysisResult {
    AnalysisResult {
        session_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        chart: NatalChart {
            subject: ChartSubject {
                nom: name.to_string(),
                prenoms: "Sophie".to_string(),
                genre: "female".to_string(),
                date_naissance: "1990-03-15".to_string(),
                heure_naissance: "14:30".to_string(),
                lieu_naissance: "Paris, France".to_string(),
            },
            positions: vec![PlanetPosition {
                planet: "Soleil".to_string(),
                sign: "Poissons".to_string(),
                house: 9,
                retrograde: false,
                degree: None,
            }],
            raw_text: "Soleil en Poissons - Maison 9".to_string(),
        },
        mission: LifeMission {
            title: "Mission de vie".to_string(),
            content: "Texte".to_string(),
        },
        metadata: AnalysisMetadata {
            processing_time: 42,
            tokens_used: 1234,
            model: "test-model".to_string(),
            cached: false,
        },
    }
}

#[tokio::test]
async fn test_concurrent_access() {
    let cache = Arc::new(AnalysisCache::default());

    let mut handles = Vec::new();
    for i in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let fingerprint = format!("fp-{}", i % 4);
            cache.put(fingerprint.clone(), analysis(&fingerprint));
            cache.get(&fingerprint).is_some()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(cache.len(), 4);
    assert_eq!(cache.stats().hits, 16);
}

#[tokio::test]
async fn test_entry_expires_exactly_at_ttl() {
    let clock = Arc::new(ManualClock::new());
    let cache = AnalysisCache::with_clock(Duration::from_secs(3600), 100, clock.clone());
    cache.put("1990-03-15|14:30|paris", analysis("Dupont"));

    clock.advance(Duration::from_secs(3599));
    assert!(cache.get("1990-03-15|14:30|paris").is_some());

    clock.advance(Duration::from_secs(1));
    assert!(cache.get("1990-03-15|14:30|paris").is_none());
}

#[tokio::test]
async fn test_cache_metrics() {
    let clock = Arc::new(ManualClock::new());
    let cache = AnalysisCache::with_clock(Duration::from_secs(10), 2, clock.clone());

    cache.put("a", analysis("a"));
    cache.put("b", analysis("b"));
    assert!(cache.get("a").is_some());
    assert!(cache.get("missing").is_none());

    clock.advance(Duration::from_secs(11));
    cache.put("c", analysis("c"));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.sweeps, 1);
    assert_eq!(stats.expirations, 2);
    assert_eq!(stats.entries, 1);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}
