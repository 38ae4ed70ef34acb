use ff_db::{NewProduct, ProductPatch, ProductRemoval};
use ff_schemas::{Product, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{validate, Actor, Platform, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_type: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

impl ProductInput {
    fn validate(&self) -> ServiceResult<()> {
        validate::non_empty("name", &self.name)?;
        validate::price_cents(self.price_cents)?;
        validate::stock(self.stock)?;
        Ok(())
    }
}

impl ProductUpdate {
    fn validate(&self) -> ServiceResult<()> {
        if let Some(name) = &self.name {
            validate::non_empty("name", name)?;
        }
        if let Some(p) = self.price_cents {
            validate::price_cents(p)?;
        }
        Ok(())
    }
}

impl Platform {
    /// Public catalogue: available products only.
    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(ff_db::list_products(&self.pool, true).await?)
    }

    /// Admin view including unavailable and retired products.
    pub async fn list_all_products(&self, actor: &Actor) -> ServiceResult<Vec<Product>> {
        actor.require(Role::Admin)?;
        Ok(ff_db::list_products(&self.pool, false).await?)
    }

    pub async fn get_product(&self, product_id: Uuid) -> ServiceResult<Product> {
        Ok(ff_db::fetch_product(&self.pool, product_id).await?)
    }

    pub async fn create_product(&self, actor: &Actor, input: ProductInput) -> ServiceResult<Product> {
        actor.require(Role::Admin)?;
        input.validate()?;
        let product = ff_db::insert_product(
            &self.pool,
            &NewProduct {
                name: input.name,
                description: input.description,
                product_type: input.product_type,
                price_cents: input.price_cents,
                stock: input.stock,
                is_available: input.is_available,
            },
        )
        .await?;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        actor: &Actor,
        product_id: Uuid,
        upd: ProductUpdate,
    ) -> ServiceResult<Product> {
        actor.require(Role::Admin)?;
        upd.validate()?;
        let patch = ProductPatch {
            name: upd.name,
            description: upd.description,
            product_type: upd.product_type,
            price_cents: upd.price_cents,
            is_available: upd.is_available,
        };
        Ok(ff_db::update_product(&self.pool, product_id, &patch).await?)
    }

    /// `delta` may be negative to write off stock; it never goes below zero.
    pub async fn restock(&self, actor: &Actor, product_id: Uuid, delta: i32) -> ServiceResult<Product> {
        actor.require(Role::Admin)?;
        if delta == 0 {
            return Err(crate::ServiceError::validation("restock delta must not be zero"));
        }
        Ok(ff_db::restock_product(&self.pool, product_id, delta).await?)
    }

    pub async fn delete_product(
        &self,
        actor: &Actor,
        product_id: Uuid,
    ) -> ServiceResult<ProductRemoval> {
        actor.require(Role::Admin)?;
        Ok(ff_db::delete_product(&self.pool, product_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: "Crêpe".to_string(),
            description: String::new(),
            product_type: "dessert".to_string(),
            price_cents: 500,
            stock: 3,
            is_available: true,
        }
    }

    #[test]
    fn product_input_rules() {
        assert!(input().validate().is_ok());
        assert!(ProductInput { name: " ".into(), ..input() }.validate().is_err());
        assert!(ProductInput { price_cents: -1, ..input() }.validate().is_err());
        assert!(ProductInput { stock: -1, ..input() }.validate().is_err());
        assert!(ProductInput { price_cents: 0, stock: 0, ..input() }.validate().is_ok());
    }

    #[test]
    fn product_update_rules() {
        assert!(ProductUpdate::default().validate().is_ok());
        assert!(ProductUpdate {
            price_cents: Some(-5),
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn product_input_json_defaults() {
        let p: ProductInput =
            serde_json::from_str(r#"{"name":"Cidre","price_cents":400}"#).unwrap();
        assert!(p.is_available);
        assert_eq!(p.stock, 0);
        assert_eq!(p.description, "");
    }
}
