use async_trait::async_trait;
use bistro_shared::{Dish, Restaurant};
use std::collections::HashMap;
use uuid::Uuid;
use crate::{CoreError, CoreResult};

/// Read access to already-fetched menu reference data
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn get_dish(&self, id: Uuid) -> CoreResult<Dish>;

    async fn get_restaurant(&self, id: Uuid) -> CoreResult<Restaurant>;

    async fn list_restaurants(&self) -> CoreResult<Vec<Restaurant>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMenu {
    dishes: HashMap<Uuid, Dish>,
    restaurants: HashMap<Uuid, Restaurant>,
}

impl InMemoryMenu {
    pub fn new(restaurants: Vec<Restaurant>, dishes: Vec<Dish>) -> Self {
        Self {
            dishes: dishes.into_iter().map(|d| (d.id, d)).collect(),
            restaurants: restaurants.into_iter().map(|r| (r.id, r)).collect(),
        }
    }
}

#[async_trait]
impl MenuRepository for InMemoryMenu {
    async fn get_dish(&self, id: Uuid) -> CoreResult<Dish> {
        self.dishes
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::DishNotFound(id.to_string()))
    }

    async fn get_restaurant(&self, id: Uuid) -> CoreResult<Restaurant> {
        self.restaurants
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::RestaurantNotFound(id.to_string()))
    }

    async fn list_restaurants(&self) -> CoreResult<Vec<Restaurant>> {
        let mut restaurants: Vec<Restaurant> = self.restaurants.values().cloned().collect();
        restaurants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(restaurants)
    }
}
