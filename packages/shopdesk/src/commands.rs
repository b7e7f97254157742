//! Catalog, review, and order commands.

use anyhow::Result;
use chat_sync::ApiError;

use crate::api::ApiClient;
use crate::config::ConsoleConfig;
use crate::models::{CategoryPayload, ProductPayload, ReviewPayload};

pub fn client(config: &ConsoleConfig) -> ApiClient {
    ApiClient::new(&config.api_url, config.load_token())
}

/// Unwrap an API result, turning `Unavailable` into a message instead of
/// an error trace.
fn handle<T>(result: Result<T, ApiError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::Unavailable) => {
            eprintln!("[shopdesk: server unreachable]");
            Ok(None)
        }
        Err(ApiError::Status { status: 401, .. }) => {
            eprintln!("Not authorized. Run `shopdesk login` first.");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

// ── Auth ────────────────────────────────────────────────────────────────

pub async fn login_command(config: &ConsoleConfig, login: &str) -> Result<()> {
    eprint!("Password: ");
    use std::io::Write;
    std::io::stderr().flush()?;
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;

    let api = ApiClient::new(&config.api_url, None);
    let token = match api.login(login, password.trim_end()).await {
        Ok(token) => token,
        Err(ApiError::Unavailable) => {
            eprintln!("[shopdesk: server unreachable]");
            return Ok(());
        }
        Err(ApiError::Status { status: 401, .. }) => {
            eprintln!("Invalid credentials.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    config.save_token(&token)?;
    eprintln!("Logged in.");
    Ok(())
}

pub fn logout_command(config: &ConsoleConfig) -> Result<()> {
    config.clear_token()?;
    eprintln!("Logged out.");
    Ok(())
}

// ── Dashboard ───────────────────────────────────────────────────────────

pub async fn stats_command(config: &ConsoleConfig, json: bool) -> Result<()> {
    let Some(stats) = handle(client(config).stats().await)? else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("categories  {}", stats.categories);
        println!("products    {}", stats.products);
        println!("chats       {}", stats.chats);
        println!("reviews     {}", stats.reviews);
    }
    Ok(())
}

// ── Categories ──────────────────────────────────────────────────────────

pub async fn categories_list_command(config: &ConsoleConfig, json: bool) -> Result<()> {
    let Some(categories) = handle(client(config).categories().await)? else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
    } else if categories.is_empty() {
        println!("No categories.");
    } else {
        println!("{:<38} {:<30} {}", "ID", "NAME", "PARENT");
        println!("{}", "-".repeat(80));
        for cat in &categories {
            println!(
                "{:<38} {:<30} {}",
                cat.id,
                truncate(&cat.name, 30),
                cat.parent_id.as_deref().unwrap_or("-")
            );
        }
        println!("\n{} category(ies)", categories.len());
    }
    Ok(())
}

pub async fn category_create_command(
    config: &ConsoleConfig,
    name: String,
    parent_id: Option<String>,
) -> Result<()> {
    let payload = CategoryPayload { name, parent_id };
    if let Some(cat) = handle(client(config).create_category(&payload).await)? {
        println!("Created category {} ({})", cat.name, cat.id);
    }
    Ok(())
}

pub async fn category_update_command(
    config: &ConsoleConfig,
    id: &str,
    name: String,
    parent_id: Option<String>,
) -> Result<()> {
    let payload = CategoryPayload { name, parent_id };
    if let Some(cat) = handle(client(config).update_category(id, &payload).await)? {
        println!("Updated category {} ({})", cat.name, cat.id);
    }
    Ok(())
}

pub async fn category_delete_command(config: &ConsoleConfig, id: &str) -> Result<()> {
    if handle(client(config).delete_category(id).await)?.is_some() {
        println!("Deleted category {id}");
    }
    Ok(())
}

// ── Products ────────────────────────────────────────────────────────────

pub async fn products_list_command(config: &ConsoleConfig, json: bool) -> Result<()> {
    let Some(products) = handle(client(config).products().await)? else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
    } else if products.is_empty() {
        println!("No products.");
    } else {
        println!("{:<38} {:<30} {:>10} {}", "ID", "NAME", "PRICE", "CATEGORY");
        println!("{}", "-".repeat(100));
        for product in &products {
            println!(
                "{:<38} {:<30} {:>10.2} {}",
                product.id,
                truncate(&product.name, 30),
                product.price,
                product.category_id.as_deref().unwrap_or("-")
            );
        }
        println!("\n{} product(s)", products.len());
    }
    Ok(())
}

pub async fn product_create_command(
    config: &ConsoleConfig,
    name: String,
    price: f64,
    description: Option<String>,
    category_id: Option<String>,
) -> Result<()> {
    let payload = ProductPayload {
        name,
        description,
        price,
        category_id,
    };
    if let Some(product) = handle(client(config).create_product(&payload).await)? {
        println!("Created product {} ({})", product.name, product.id);
    }
    Ok(())
}

pub async fn product_update_command(
    config: &ConsoleConfig,
    id: &str,
    name: String,
    price: f64,
    description: Option<String>,
    category_id: Option<String>,
) -> Result<()> {
    let payload = ProductPayload {
        name,
        description,
        price,
        category_id,
    };
    if let Some(product) = handle(client(config).update_product(id, &payload).await)? {
        println!("Updated product {} ({})", product.name, product.id);
    }
    Ok(())
}

pub async fn product_delete_command(config: &ConsoleConfig, id: &str) -> Result<()> {
    if handle(client(config).delete_product(id).await)?.is_some() {
        println!("Deleted product {id}");
    }
    Ok(())
}

// ── Reviews ─────────────────────────────────────────────────────────────

pub async fn reviews_list_command(config: &ConsoleConfig, json: bool) -> Result<()> {
    let Some(reviews) = handle(client(config).reviews().await)? else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reviews)?);
    } else if reviews.is_empty() {
        println!("No reviews.");
    } else {
        println!("{:<38} {:<6} {:<16} {}", "ID", "STARS", "AUTHOR", "CONTENT");
        println!("{}", "-".repeat(100));
        for review in &reviews {
            println!(
                "{:<38} {:<6} {:<16} {}",
                review.id,
                review.rating,
                truncate(review.author.as_deref().unwrap_or("-"), 16),
                truncate(&review.content, 40)
            );
        }
        println!("\n{} review(s)", reviews.len());
    }
    Ok(())
}

pub async fn review_create_command(
    config: &ConsoleConfig,
    content: String,
    rating: i32,
    author: Option<String>,
) -> Result<()> {
    let payload = ReviewPayload {
        content,
        rating,
        avatar: None,
        author,
    };
    if let Some(review) = handle(client(config).create_review(&payload).await)? {
        println!("Created review {}", review.id);
    }
    Ok(())
}

pub async fn review_delete_command(config: &ConsoleConfig, id: &str) -> Result<()> {
    if handle(client(config).delete_review(id).await)?.is_some() {
        println!("Deleted review {id}");
    }
    Ok(())
}

// ── Orders ──────────────────────────────────────────────────────────────

pub async fn orders_list_command(config: &ConsoleConfig, json: bool) -> Result<()> {
    let Some(orders) = handle(client(config).orders().await)? else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&orders)?);
    } else if orders.is_empty() {
        println!("No orders.");
    } else {
        println!("{:<38} {:<20} {:<16} {}", "ID", "NAME", "PHONE", "ITEMS");
        println!("{}", "-".repeat(100));
        for order in &orders {
            let items: Vec<String> = order
                .products
                .iter()
                .map(|item| {
                    let name = item
                        .product
                        .as_ref()
                        .map(|p| p.name.as_str())
                        .unwrap_or("?");
                    format!("{}x {}", item.quantity, name)
                })
                .collect();
            println!(
                "{:<38} {:<20} {:<16} {}",
                order.id,
                truncate(&order.name, 20),
                order.phone_number,
                truncate(&items.join(", "), 40)
            );
        }
        println!("\n{} order(s)", orders.len());
    }
    Ok(())
}

pub async fn order_delete_command(config: &ConsoleConfig, id: &str) -> Result<()> {
    if handle(client(config).delete_order(id).await)?.is_some() {
        println!("Deleted order {id}");
    }
    Ok(())
}
