mod support;

use std::path::Path;

use kvitok_client::commands::{patterns, receipts, shops};
use kvitok_client::commands::patterns::PatternAddOptions;
use kvitok_client::commands::shops::ShopUpdateOptions;
use kvitok_client::shops::ShopUpdate;
use serde_json::Value;
use support::receipt_testkit::{
    count_rows, ingest_ok, item, receipt_document, register_user, temp_home, with_shop,
};

fn seed_shop(home: &Path, user_id: &str, external_id: &str, retail_name: &str, inn: &str, address: &str) -> String {
    let document = with_shop(
        receipt_document(external_id, "2026-03-01T10:00:00", 100, vec![item("Соль", 100, 1.0, 100)]),
        retail_name,
        Some(inn),
        address,
    );
    let report = ingest_ok(home, user_id, &document);
    let receipt_id = report["receipt_id"].as_str().unwrap_or_default().to_string();
    let detail = receipts::show_with_home_override(user_id, &receipt_id, Some(home));
    assert!(detail.is_ok());
    detail
        .ok()
        .and_then(|envelope| envelope.data["shop"]["shop_id"].as_str().map(str::to_string))
        .unwrap_or_default()
}

fn resolve(home: &Path, user_id: &str, trade_name: &str, address: Option<&str>) -> Value {
    let result = shops::resolve_with_home_override(user_id, trade_name, address, Some(home));
    assert!(result.is_ok());
    result
        .ok()
        .map(|envelope| envelope.data["shop_id"].clone())
        .unwrap_or(Value::Null)
}

fn add_pattern(
    home: &Path,
    user_id: &str,
    shop_id: &str,
    pattern_type: &str,
    value: &str,
    is_regex: bool,
    priority: i64,
) -> Value {
    let result = patterns::add_with_options(PatternAddOptions {
        user_id: user_id.to_string(),
        shop_id: shop_id.to_string(),
        pattern_type: pattern_type.to_string(),
        pattern_value: value.to_string(),
        is_regex,
        priority: Some(priority),
        home_override: Some(home),
    });
    assert!(result.is_ok(), "pattern add failed: {:?}", result.as_ref().err());
    result.ok().map(|envelope| envelope.data).unwrap_or(Value::Null)
}

#[test]
fn exact_match_is_case_insensitive_and_respects_address() {
    let temp = temp_home("kvitok-resolve-exact");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let lenina = seed_shop(&home, &user_id, "a", "Пятёрочка", "7700000001", "ул. Ленина, 1");
        // A distinct name first, otherwise ingestion folds it into the first outlet.
        let mira = seed_shop(&home, &user_id, "b", "Пятёрочка Мира", "7700000002", "ул. Мира, 3");
        let renamed = shops::update_with_options(ShopUpdateOptions {
            user_id: user_id.clone(),
            shop_id: mira.clone(),
            update: ShopUpdate {
                retail_name: Some("Пятёрочка".to_string()),
                ..ShopUpdate::default()
            },
            home_override: Some(&home),
        });
        assert!(renamed.is_ok());

        assert_eq!(resolve(&home, &user_id, "ПЯТЁРОЧКА", Some("УЛ. МИРА, 3")), Value::from(mira));
        assert_eq!(
            resolve(&home, &user_id, "пятёрочка", Some("ул. Ленина, 1")),
            Value::from(lenina.clone())
        );
        assert_eq!(resolve(&home, &user_id, "Пятёрочка", None), Value::from(lenina));
    }
}

#[test]
fn lower_priority_pattern_wins() {
    let temp = temp_home("kvitok-resolve-priority");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let first = seed_shop(&home, &user_id, "a", "Магнит Семейный", "7700000001", "пр. Мира, 10");
        let second = seed_shop(&home, &user_id, "b", "Магнит у дома", "7700000002", "ул. Садовая, 5");

        add_pattern(&home, &user_id, &second, "name", "ММ ", false, 5);
        add_pattern(&home, &user_id, &first, "name", "^мм\\s", true, 1);

        assert_eq!(resolve(&home, &user_id, "ММ Гиппопо", None), Value::from(first));
    }
}

#[test]
fn invalid_regex_never_breaks_resolution() {
    let temp = temp_home("kvitok-resolve-regex");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let broken_target = seed_shop(&home, &user_id, "a", "Лента", "7700000001", "ш. Энтузиастов, 1");
        let good_target = seed_shop(&home, &user_id, "b", "Перекрёсток", "7700000002", "ул. Тверская, 8");

        let broken = add_pattern(&home, &user_id, &broken_target, "name", "([unclosed", true, 1);
        assert_eq!(broken["regex_valid"], false);
        let good = add_pattern(&home, &user_id, &good_target, "both", "x5.*тверская", true, 2);
        assert_eq!(good["regex_valid"], true);

        assert_eq!(
            resolve(&home, &user_id, "X5 Retail", Some("Москва, ул. Тверская, 8")),
            Value::from(good_target)
        );
    }
}

#[test]
fn address_patterns_are_skipped_without_an_address() {
    let temp = temp_home("kvitok-resolve-address");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let shop_id = seed_shop(&home, &user_id, "a", "Вкусвилл", "7700000001", "ул. Ленина, 1");
        add_pattern(&home, &user_id, &shop_id, "address", "ленина", false, 1);

        assert_eq!(resolve(&home, &user_id, "Кофейня", None), Value::Null);
        assert_eq!(
            resolve(&home, &user_id, "Кофейня", Some("г. Москва, ул. Ленина, 1")),
            Value::from(shop_id)
        );
    }
}

#[test]
fn partial_match_and_no_match() {
    let temp = temp_home("kvitok-resolve-partial");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let shop_id = seed_shop(&home, &user_id, "a", "Пятёрочка №1234", "7700000001", "ул. Ленина, 1");

        assert_eq!(resolve(&home, &user_id, "пятёрочка", Some("ул. Мира, 3")), Value::from(shop_id));
        assert_eq!(resolve(&home, &user_id, "Ашан", None), Value::Null);
        assert_eq!(resolve(&home, &user_id, "   ", None), Value::Null);
    }
}

#[test]
fn ingestion_routes_receipts_through_patterns() {
    let temp = temp_home("kvitok-resolve-ingest");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let home_shop = seed_shop(&home, &user_id, "a", "Мой магазин", "7700000001", "ул. Ленина, 1");
        add_pattern(&home, &user_id, &home_shop, "name", "ип сидоров", false, 1);

        let document = with_shop(
            receipt_document("b", "2026-03-02T10:00:00", 100, vec![item("Соль", 100, 1.0, 100)]),
            "ИП Сидоров А.А.",
            Some("7700000099"),
            "рынок",
        );
        ingest_ok(&home, &user_id, &document);

        assert_eq!(count_rows(&home, "SELECT COUNT(*) FROM shops"), 1);
    }
}

#[test]
fn patterns_are_scoped_to_owned_shops() {
    let temp = temp_home("kvitok-pattern-owner");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let anna = register_user(&home, "anna@example.com");
        let boris = register_user(&home, "boris@example.com");
        let annas_shop = seed_shop(&home, &anna, "a", "Лента", "7700000001", "ш. Энтузиастов, 1");

        let result = patterns::add_with_options(PatternAddOptions {
            user_id: boris,
            shop_id: annas_shop,
            pattern_type: "name".to_string(),
            pattern_value: "лента".to_string(),
            is_regex: false,
            priority: None,
            home_override: Some(&home),
        });
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "shop_not_found");
        }

        let bad_type = patterns::add_with_options(PatternAddOptions {
            user_id: anna,
            shop_id: "shop_x".to_string(),
            pattern_type: "nickname".to_string(),
            pattern_value: "лента".to_string(),
            is_regex: false,
            priority: None,
            home_override: Some(&home),
        });
        assert!(bad_type.is_err());
        if let Err(error) = bad_type {
            assert_eq!(error.code, "invalid_argument");
        }
    }
}

#[test]
fn patterns_list_in_priority_order_and_can_be_removed() {
    let temp = temp_home("kvitok-pattern-crud");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let shop_id = seed_shop(&home, &user_id, "a", "Лента", "7700000001", "ш. Энтузиастов, 1");
        let late = add_pattern(&home, &user_id, &shop_id, "name", "lenta", false, 20);
        let early = add_pattern(&home, &user_id, &shop_id, "name", "лента", false, 3);
        assert_eq!(early["priority"], 3);

        let listed = patterns::list_with_home_override(&user_id, Some(&home));
        assert!(listed.is_ok());
        if let Ok(envelope) = listed {
            assert_eq!(envelope.data["patterns"][0]["pattern_id"], early["pattern_id"]);
            assert_eq!(envelope.data["patterns"][1]["pattern_id"], late["pattern_id"]);
        }

        let pattern_id = late["pattern_id"].as_str().unwrap_or_default();
        assert!(patterns::remove_with_home_override(&user_id, pattern_id, Some(&home)).is_ok());
        let again = patterns::remove_with_home_override(&user_id, pattern_id, Some(&home));
        assert!(again.is_err());
        if let Err(error) = again {
            assert_eq!(error.code, "pattern_not_found");
        }
    }
}

#[test]
fn shop_edits_and_guarded_delete() {
    let temp = temp_home("kvitok-shop-edit");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let shop_id = seed_shop(&home, &user_id, "a", "Лента", "7700000001", "ш. Энтузиастов, 1");
        add_pattern(&home, &user_id, &shop_id, "name", "лента", false, 1);

        let updated = shops::update_with_options(ShopUpdateOptions {
            user_id: user_id.clone(),
            shop_id: shop_id.clone(),
            update: ShopUpdate {
                category: Some("Продукты".to_string()),
                is_favorite: Some(true),
                ..ShopUpdate::default()
            },
            home_override: Some(&home),
        });
        assert!(updated.is_ok());
        if let Ok(envelope) = updated {
            assert_eq!(envelope.data["category"], "Продукты");
            assert_eq!(envelope.data["is_favorite"], true);
            assert_eq!(envelope.data["retail_name"], "Лента");
        }

        let favorites = shops::list_with_home_override(&user_id, true, Some(&home));
        assert!(favorites.is_ok());
        if let Ok(envelope) = favorites {
            assert_eq!(envelope.data["shops"].as_array().map(Vec::len), Some(1));
        }

        let blocked = shops::delete_with_home_override(&user_id, &shop_id, Some(&home));
        assert!(blocked.is_err());
        if let Err(error) = blocked {
            assert_eq!(error.code, "shop_in_use");
        }

        let receipt_ids = count_rows(&home, "SELECT COUNT(*) FROM receipts");
        assert_eq!(receipt_ids, 1);
        let listed = receipts::list_with_home_override(&user_id, None, None, Some(&home));
        assert!(listed.is_ok());
        if let Ok(envelope) = listed {
            let receipt_id = envelope.data["receipts"][0]["receipt_id"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let deleted = receipts::delete_with_home_override(&user_id, &receipt_id, Some(&home));
            assert!(deleted.is_ok());
            if let Ok(result) = deleted {
                assert_eq!(result.data["items_deleted"], 1);
            }
        }

        assert!(shops::delete_with_home_override(&user_id, &shop_id, Some(&home)).is_ok());
        assert_eq!(count_rows(&home, "SELECT COUNT(*) FROM store_patterns"), 0);
        assert_eq!(count_rows(&home, "SELECT COUNT(*) FROM receipt_items"), 0);
    }
}
