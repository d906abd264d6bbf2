mod support;

use std::path::Path;

use chrono::{TimeZone, Utc};
use kvitok_client::analytics::Pagination;
use kvitok_client::commands::analytics::{self, ShopSpendingOptions, TopProductsOptions};
use serde_json::Value;
use support::receipt_testkit::{
    count_rows, ingest_ok, item, receipt_document, register_user, temp_home, with_shop,
};

fn seed_receipt(home: &Path, user_id: &str, external_id: &str, date_time: &str, items: Vec<Value>) {
    let total = items
        .iter()
        .filter_map(|entry| entry["sum"].as_i64())
        .sum::<i64>();
    ingest_ok(home, user_id, &receipt_document(external_id, date_time, total, items));
}

fn seed_shops(home: &Path, user_id: &str, count: usize) {
    for index in 1..=count {
        let total = 100 * i64::try_from(index).unwrap_or(0);
        let document = with_shop(
            receipt_document(
                &format!("shop-{index:02}"),
                "2026-04-01T09:00:00",
                total,
                vec![item("Хлеб", total, 1.0, total)],
            ),
            &format!("Точка {index:02}"),
            Some(&format!("77000000{index:02}")),
            &format!("ул. Строителей, {index}"),
        );
        ingest_ok(home, user_id, &document);
    }
}

fn by_shop(home: &Path, user_id: &str, sort_by: Option<&str>, descending: bool, pagination: Pagination) -> Value {
    let result = analytics::by_shop_with_options(ShopSpendingOptions {
        user_id: user_id.to_string(),
        sort_by: sort_by.map(str::to_string),
        descending,
        pagination,
        home_override: Some(home),
    });
    assert!(result.is_ok(), "by-shop failed: {:?}", result.as_ref().err());
    result.ok().map(|envelope| envelope.data).unwrap_or(Value::Null)
}

fn shop_ids(data: &Value) -> Vec<String> {
    data["shops"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row["shop_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn totals_are_zero_for_a_user_without_receipts() {
    let temp = temp_home("kvitok-analytics-zero");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        let result = analytics::total_with_home_override(&user_id, Some(&home));
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.data["total_sum"], 0);
            assert_eq!(envelope.data["cash_total_sum"], 0);
            assert_eq!(envelope.data["ecash_total_sum"], 0);
            assert_eq!(envelope.data["receipts_count"], 0);
        }

        let shops = by_shop(&home, &user_id, None, true, Pagination::default());
        assert_eq!(shop_ids(&shops).len(), 0);
    }
}

#[test]
fn totals_sum_every_receipt() {
    let temp = temp_home("kvitok-analytics-total");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        seed_receipt(&home, &user_id, "a", "2026-01-10T10:00:00", vec![item("Соль", 4590, 1.0, 4590)]);
        seed_receipt(&home, &user_id, "b", "2026-02-10T10:00:00", vec![item("Сахар", 8900, 2.0, 17800)]);

        let result = analytics::total_with_home_override(&user_id, Some(&home));
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.data["total_sum"], 22390);
            assert_eq!(envelope.data["ecash_total_sum"], 22390);
            assert_eq!(envelope.data["receipts_count"], 2);
        }
    }
}

#[test]
fn monthly_dynamics_lists_only_months_with_receipts() {
    let temp = temp_home("kvitok-analytics-monthly");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        seed_receipt(&home, &user_id, "a", "2026-03-02T10:00:00", vec![item("Соль", 1000, 1.0, 1000)]);
        seed_receipt(&home, &user_id, "b", "2026-03-28T18:30:00", vec![item("Соль", 500, 1.0, 500)]);
        seed_receipt(&home, &user_id, "c", "2026-07-14T08:00:00", vec![item("Соль", 700, 1.0, 700)]);
        seed_receipt(&home, &user_id, "d", "2025-03-14T08:00:00", vec![item("Соль", 900, 1.0, 900)]);

        let result = analytics::monthly_with_home_override(&user_id, 2026, Some(&home));
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let months = envelope.data["months"].as_array().cloned().unwrap_or_default();
            assert_eq!(months.len(), 2);
            assert_eq!(months[0]["month"], 3);
            assert_eq!(months[0]["total_sum"], 1500);
            assert_eq!(months[0]["receipts_count"], 2);
            assert_eq!(months[1]["month"], 7);
            assert_eq!(months[1]["total_sum"], 700);
        }

        let empty = analytics::monthly_with_home_override(&user_id, 2024, Some(&home));
        assert!(empty.is_ok());
        if let Ok(envelope) = empty {
            assert_eq!(envelope.data["months"].as_array().map(Vec::len), Some(0));
        }

        let invalid = analytics::monthly_with_home_override(&user_id, 0, Some(&home));
        assert!(invalid.is_err());
        if let Err(error) = invalid {
            assert_eq!(error.code, "invalid_argument");
        }
    }
}

#[test]
fn months_follow_the_wall_clock_time_on_the_receipt() {
    let temp = temp_home("kvitok-analytics-wall-clock");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        seed_receipt(&home, &user_id, "a", "2026-04-01T00:30:00+03:00", vec![item("Соль", 1000, 1.0, 1000)]);

        let result = analytics::monthly_with_home_override(&user_id, 2026, Some(&home));
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let months = envelope.data["months"].as_array().cloned().unwrap_or_default();
            assert_eq!(months.len(), 1);
            assert_eq!(months[0]["month"], 4);
            assert_eq!(months[0]["total_sum"], 1000);
        }
        assert_eq!(
            count_rows(
                &home,
                "SELECT COUNT(*) FROM receipts WHERE date_time = '2026-04-01 00:30:00'"
            ),
            1
        );
    }
}

#[test]
fn page_and_offset_pagination_return_the_same_rows() {
    let temp = temp_home("kvitok-analytics-pages");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        seed_shops(&home, &user_id, 25);

        let everything = by_shop(&home, &user_id, Some("total_amount"), true, Pagination::default());
        let all_ids = shop_ids(&everything);
        assert_eq!(all_ids.len(), 25);
        assert_eq!(everything["shops"][0]["total_amount"], 2500);
        assert_eq!(everything["limit"], Value::Null);

        let paged = by_shop(
            &home,
            &user_id,
            Some("total_amount"),
            true,
            Pagination {
                page: Some(2),
                page_size: Some(10),
                ..Pagination::default()
            },
        );
        let offset = by_shop(
            &home,
            &user_id,
            Some("total_amount"),
            true,
            Pagination {
                offset: Some(10),
                limit: Some(10),
                ..Pagination::default()
            },
        );
        assert_eq!(shop_ids(&paged), shop_ids(&offset));
        assert_eq!(shop_ids(&paged), all_ids[10..20].to_vec());

        let last_page = by_shop(
            &home,
            &user_id,
            Some("total_amount"),
            true,
            Pagination {
                page: Some(3),
                page_size: Some(10),
                ..Pagination::default()
            },
        );
        assert_eq!(shop_ids(&last_page).len(), 5);

        let clamped = by_shop(
            &home,
            &user_id,
            Some("total_amount"),
            true,
            Pagination {
                page: Some(0),
                page_size: Some(10),
                ..Pagination::default()
            },
        );
        assert_eq!(shop_ids(&clamped), all_ids[0..10].to_vec());
        assert_eq!(clamped["offset"], 0);

        let default_page_size = by_shop(
            &home,
            &user_id,
            None,
            true,
            Pagination {
                page: Some(1),
                ..Pagination::default()
            },
        );
        assert_eq!(shop_ids(&default_page_size).len(), 20);
    }
}

#[test]
fn shop_sorting_honours_key_and_direction() {
    let temp = temp_home("kvitok-analytics-sort");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        seed_shops(&home, &user_id, 3);

        let ascending = by_shop(&home, &user_id, Some("retail_name"), false, Pagination::default());
        assert_eq!(ascending["shops"][0]["retail_name"], "Точка 01");
        assert_eq!(ascending["shops"][2]["retail_name"], "Точка 03");
        assert_eq!(ascending["sort_by"], "retail_name");

        let average = by_shop(&home, &user_id, Some("receipt_avg"), true, Pagination::default());
        assert_eq!(average["shops"][0]["receipt_avg"], 300.0);

        let fallback = by_shop(&home, &user_id, Some("shop_id; DROP TABLE shops"), false, Pagination::default());
        assert_eq!(fallback["sort_by"], "total_amount");
        assert_eq!(fallback["descending"], true);
        assert_eq!(fallback["shops"][0]["total_amount"], 300);
        assert_eq!(fallback["shops"][2]["total_amount"], 100);
    }
}

#[test]
fn top_products_group_by_name_and_measure_within_the_window() {
    let temp = temp_home("kvitok-analytics-top");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        seed_receipt(
            &home,
            &user_id,
            "before-window",
            "2026-03-14T23:59:00",
            vec![item("Икра", 99900, 1.0, 99900)],
        );
        seed_receipt(
            &home,
            &user_id,
            "window-start",
            "2026-03-15T00:00:00",
            vec![item("Бананы", 12990, 1.5, 19485), item("Молоко", 8990, 2.0, 17980)],
        );
        seed_receipt(
            &home,
            &user_id,
            "inside",
            "2026-05-20T12:00:00",
            vec![item("Бананы", 1500, 2.0, 3000), item("Молоко", 8990, 1.0, 8990)],
        );
        seed_receipt(
            &home,
            &user_id,
            "after-as-of",
            "2026-06-15T13:00:00",
            vec![item("Трюфель", 500000, 1.0, 500000)],
        );

        let as_of = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).single();
        assert!(as_of.is_some());
        let result = analytics::top_products_with_options(TopProductsOptions {
            user_id: user_id.clone(),
            months_back: Some(3),
            limit: Some(10),
            as_of,
            home_override: Some(&home),
        });
        assert!(result.is_ok(), "top-products failed: {:?}", result.as_ref().err());
        if let Ok(envelope) = result {
            let products = envelope.data["products"].as_array().cloned().unwrap_or_default();
            assert_eq!(products.len(), 3);
            assert_eq!(products[0]["name"], "Молоко");
            assert_eq!(products[0]["measure"], "шт");
            assert_eq!(products[0]["total_sum"], 26970);
            assert_eq!(products[0]["total_quantity"], 3.0);
            assert_eq!(products[1]["name"], "Бананы");
            assert_eq!(products[1]["measure"], "кг");
            assert_eq!(products[2]["name"], "Бананы");
            assert_eq!(products[2]["measure"], "шт");
        }

        let lifetime = analytics::top_products_with_options(TopProductsOptions {
            user_id: user_id.clone(),
            months_back: None,
            limit: Some(1),
            as_of,
            home_override: Some(&home),
        });
        assert!(lifetime.is_ok());
        if let Ok(envelope) = lifetime {
            assert_eq!(envelope.data["products"][0]["name"], "Трюфель");
            assert_eq!(envelope.data["products"].as_array().map(Vec::len), Some(1));
        }
    }
}

#[test]
fn top_products_limit_is_bounded() {
    let temp = temp_home("kvitok-analytics-limit");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let user_id = register_user(&home, "anna@example.com");
        for limit in [0, 51, -3] {
            let result = analytics::top_products_with_options(TopProductsOptions {
                user_id: user_id.clone(),
                months_back: None,
                limit: Some(limit),
                as_of: None,
                home_override: Some(&home),
            });
            assert!(result.is_err());
            if let Err(error) = result {
                assert_eq!(error.code, "invalid_argument");
            }
        }
    }
}

#[test]
fn analytics_require_a_known_user() {
    let temp = temp_home("kvitok-analytics-user");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let result = analytics::total_with_home_override("usr_missing", Some(&home));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "user_not_found");
        }
    }
}
