pub mod analytics;
pub mod analyzer;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod state;

pub use config::{AppConfig, Settings};
pub use error::AppError;
pub use state::{AppState, DbAccess};

// ─── E2E Integration Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use crate::analytics::{AggregateResult, AnalyticsFilters, Dimension};
    use crate::commands::{analytics, import, reference, taxonomy, tickets};
    use crate::model::{Magasin, Statut, TaxonomyPath, TicketForm};
    use crate::{AppError, AppState, Settings};

    fn form(magasin: &str, thematique: &str, rembour: &str) -> TicketForm {
        TicketForm {
            nom_prenom: Some("Client Test".into()),
            canal: Some("Email".into()),
            statut: Some("Ouvert".into()),
            thematique: Some(thematique.into()),
            famille: Some("Retard".into()),
            sous_famille: Some("Colis".into()),
            categorie: Some("Transporteur".into()),
            sous_categorie: Some("Relais".into()),
            action: Some("Remboursement".into()),
            magasin: Some(magasin.into()),
            mnt_rembour: Some(rembour.into()),
            ..Default::default()
        }
    }

    fn open_tmp(dir: &tempfile::TempDir) -> AppState {
        let settings = Settings {
            db_path: dir.path().join("data/ticketing.db").to_str().unwrap().to_string(),
        };
        AppState::open(&settings).expect("ouverture de la base")
    }

    /// E2E: reference data → taxonomy import → tickets → close → analytics
    #[test]
    fn test_e2e_ticket_lifecycle_and_analytics() {
        let dir = tempfile::tempdir().unwrap();
        let state = open_tmp(&dir);

        // 1. Reference data
        for (name, bu) in [("Casa Anfa", "Nord"), ("Tanger", "Nord"), ("Agadir", "Sud")] {
            reference::add_magasin(
                &state,
                Magasin {
                    magasin: name.into(),
                    bu: bu.into(),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        let csv = dir.path().join("thematiques.csv");
        std::fs::write(
            &csv,
            "Thématique;Famille;Sous famille;Catégorie;Sous catégorie;Actions\n\
             Livraison;Retard;Colis;Transporteur;Relais;Remboursement\n",
        )
        .unwrap();
        import::import_taxonomy_csv(&state, csv.to_str().unwrap(), true).unwrap();
        let children =
            taxonomy::resolve_taxonomy_children(&state, TaxonomyPath::from_levels(&["livraison"]))
                .unwrap();
        assert_eq!(children.values, vec!["Retard"]);

        // 2. Tickets
        let t1 = tickets::create_ticket(&state, form("casa anfa", "Livraison", "10,50"), "sara")
            .unwrap();
        let t2 = tickets::create_ticket(&state, form("Tanger", "Livraison", "4.5"), "karim")
            .unwrap();
        let t3 = tickets::create_ticket(&state, form("Agadir", "Produit", ""), "sara").unwrap();
        assert_eq!((t1.id.as_str(), t2.id.as_str(), t3.id.as_str()), ("1", "2", "3"));
        assert_eq!(t1.store.bu, "Nord");

        // 3. Close and reclose
        let closed = tickets::close_ticket(&state, "2.0", "nadia").unwrap();
        assert_eq!(closed.statut, Statut::Cloture);
        assert!(matches!(
            tickets::close_ticket(&state, "2", "nadia"),
            Err(AppError::NoopClose(_))
        ));

        // 4. Analytics
        match analytics::aggregate(&state, Dimension::ByBu, AnalyticsFilters::default()).unwrap() {
            AggregateResult::Breakdown(b) => {
                assert_eq!(b.labels, vec!["Nord", "Sud"]);
                assert_eq!(b.values, vec![2, 1]);
                assert_eq!(b.percentages, vec![66.67, 33.33]);
                assert_eq!(b.total, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        match analytics::aggregate(&state, Dimension::ActionsAmount, AnalyticsFilters::default())
            .unwrap()
        {
            AggregateResult::Amounts(a) => {
                assert_eq!(a.actions, vec!["Remboursement"]);
                assert_eq!(a.total, 15.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        let nord_promo = AnalyticsFilters {
            bu: Some("nord".into()),
            promo_min: Some("10".into()),
            ..Default::default()
        };
        assert_eq!(analytics::total_count(&state, nord_promo).unwrap(), 1);

        let options = analytics::filter_options(&state).unwrap();
        assert_eq!(options.bus, vec!["Nord", "Sud"]);
        assert_eq!(options.promo_max, Some(10.5));
    }

    /// E2E: two independent states on the same file allocate disjoint ids
    #[test]
    fn test_e2e_concurrent_creation() {
        let dir = tempfile::tempdir().unwrap();
        drop(open_tmp(&dir));

        let states: Vec<Arc<AppState>> = (0..3).map(|_| Arc::new(open_tmp(&dir))).collect();
        let handles: Vec<_> = states
            .iter()
            .cloned()
            .map(|state| {
                std::thread::spawn(move || {
                    (0..10)
                        .map(|_| {
                            tickets::create_ticket(&state, form("Agadir", "Livraison", "1"), "sara")
                                .unwrap()
                                .id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .map(|id| id.parse().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=30).collect::<Vec<i64>>());

        let stats = tickets::ticket_stats(&states[0]).unwrap();
        assert_eq!(stats.total, 30);
    }
}
