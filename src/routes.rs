use std::cmp::Reverse;
use std::collections::BTreeMap;

use actix_web::dev::Payload;
use actix_web::http::header::HeaderValue;
use actix_web::{delete, get, post, put, web, FromRequest, HttpRequest, HttpResponse};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use failsafe::backoff::EqualJittered;
use failsafe::failure_policy::{ConsecutiveFailures, OrElse, SuccessRateOverTimeWindow};
use failsafe::{CircuitBreaker, StateMachine};
use futures_util::future::{ready, Ready};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cache::ListingCache;
use crate::composition::BaseComponent;
use crate::config::{NutritionSettings, Settings};
use crate::error::ServiceError;
use crate::models::{
    Food, Ingredient, IngredientListing, IngredientTag, NewFood, NewIngredient, NewPrice,
    NewRecipe, NewTarget, Tag,
};
use crate::nutrients::NutrientRecord;
use crate::prices::{PriceIndex, PricedOffer};
use crate::query::{self, RecipeLine, RecipeListing};
use crate::ratios::{add_nutrition_ratios, NutritionData, NutritionInput};

pub(crate) type DbPool = r2d2::Pool<ConnectionManager<MysqlConnection>>;

pub(crate) type CircuitBreakerType = StateMachine<
    OrElse<SuccessRateOverTimeWindow<EqualJittered>, ConsecutiveFailures<EqualJittered>>,
    (),
>;

const VIEWER_HEADER: &str = "X-User-Id";

/// The user a request is made for, taken from the `X-User-Id` header.
/// `None` means an anonymous request that only sees global rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Viewer(pub Option<i32>);

impl Viewer {
    fn require(self) -> Result<i32, ServiceError> {
        self.0.ok_or(ServiceError::Unauthorized)
    }
}

fn parse_viewer(value: Option<&HeaderValue>) -> Result<Option<i32>, ServiceError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or_else(|| {
            ServiceError::Validation(format!("{VIEWER_HEADER} must be a positive integer"))
        })
}

impl FromRequest for Viewer {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(parse_viewer(req.headers().get(VIEWER_HEADER)).map(Viewer))
    }
}

/// Runs blocking database work on the thread pool behind the circuit breaker.
///
/// Only outages (pool errors and lost MySQL connections) count as breaker
/// failures, so a burst of bad input cannot open the circuit. While it is
/// open the work is not attempted at all.
async fn guarded<F, T>(
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce(&MysqlConnection) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    web::block(move || {
        let outcome = breaker.call_with(ServiceError::is_outage, || -> Result<T, ServiceError> {
            let conn = pool.get()?;
            work(&conn)
        });
        match outcome {
            Ok(value) => Ok(value),
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => {
                warn!("circuit breaker is open, database call rejected");
                Err(ServiceError::Unavailable)
            }
        }
    })
    .await?
}

async fn invalidate_listings(cache: web::Data<ListingCache>) -> Result<(), ServiceError> {
    web::block(move || cache.invalidate()).await?;
    Ok(())
}

// Ingredients

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SortOrder {
    /// Most recently edited first.
    #[default]
    Recent,
    /// Highest rank first; ties keep the recent-first order.
    Rank,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    sort: SortOrder,
}

#[derive(Debug, Serialize)]
struct IngredientSummary {
    #[serde(flatten)]
    ingredient: Ingredient,
    tags: Vec<String>,
    best_price: Option<Decimal>,
    nutrition_data: NutritionData,
    sort_rank: i64,
}

fn summarize(
    listings: Vec<IngredientListing>,
    settings: &NutritionSettings,
    order: SortOrder,
) -> Vec<IngredientSummary> {
    let mut summaries: Vec<IngredientSummary> = listings
        .into_iter()
        .map(|listing| {
            let nutrition_data = listing
                .ingredient
                .nutrition_data(settings, listing.best_price);
            IngredientSummary {
                sort_rank: nutrition_data.sort_rank(),
                nutrition_data,
                best_price: listing.best_price,
                tags: listing.tags,
                ingredient: listing.ingredient,
            }
        })
        .collect();
    if order == SortOrder::Rank {
        summaries.sort_by_key(|summary| Reverse(summary.sort_rank));
    }
    summaries
}

#[get("/apis/ingredients")]
async fn list_ingredients(
    viewer: Viewer,
    params: web::Query<ListQuery>,
    settings: web::Data<Settings>,
    cache: web::Data<ListingCache>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let scope = viewer.0;
    let lookup = cache.clone();
    let listings = match web::block(move || lookup.get(scope)).await? {
        Some(listings) => listings,
        None => {
            let places = settings.nutrition.cost_decimal_places;
            let listings = guarded(breaker, pool, move |conn| {
                query::find_ingredient_listings(scope, places, conn)
            })
            .await?;
            let stored = listings.clone();
            web::block(move || cache.put(scope, &stored)).await?;
            listings
        }
    };
    Ok(HttpResponse::Ok().json(summarize(listings, &settings.nutrition, params.sort)))
}

#[derive(Debug, Serialize)]
struct IngredientDetail {
    #[serde(flatten)]
    ingredient: Ingredient,
    tags: Vec<IngredientTag>,
    sorted_prices: Vec<PricedOffer>,
    lowest_price: Option<PricedOffer>,
    best_price: Option<Decimal>,
    price_count: usize,
    nutrition_data: NutritionData,
    /// Recipe slug to name, for every recipe that contains the ingredient at
    /// any depth.
    used_in_recipes: BTreeMap<String, String>,
    recipe_generations: usize,
}

#[get("/apis/ingredients/{slug}")]
async fn ingredient_detail(
    slug: web::Path<String>,
    viewer: Viewer,
    settings: web::Data<Settings>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let slug = slug.into_inner();
    let scope = viewer.0;
    let (ingredient, prices, tags, graph) = guarded(breaker, pool, move |conn| {
        let ingredient = query::find_ingredient(&slug, scope, conn)?;
        let prices = query::find_prices(&[ingredient.id], conn)?
            .remove(&ingredient.id)
            .unwrap_or_default();
        let tags = query::find_ingredient_tags(&[ingredient.id], conn)?
            .remove(&ingredient.id)
            .unwrap_or_default();
        let graph = query::load_recipe_graph(scope, conn)?;
        Ok((ingredient, prices, tags, graph))
    })
    .await?;

    let index = PriceIndex::new(prices);
    let best_price = index.best_price(settings.nutrition.cost_decimal_places);
    let membership = graph.used_in_recipes(ingredient.id);
    debug!(
        "{} is used in {} recipes over {} generations",
        ingredient.slug,
        membership.recipes.len(),
        membership.generations
    );

    Ok(HttpResponse::Ok().json(IngredientDetail {
        nutrition_data: ingredient.nutrition_data(&settings.nutrition, best_price),
        tags,
        sorted_prices: index.sorted_prices().to_vec(),
        lowest_price: index.lowest_price().cloned(),
        best_price,
        price_count: index.price_count(),
        used_in_recipes: membership.recipes,
        recipe_generations: membership.generations,
        ingredient,
    }))
}

#[post("/apis/ingredients")]
async fn create_ingredient(
    new: web::Json<NewIngredient>,
    viewer: Viewer,
    cache: web::Data<ListingCache>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let owner = viewer.require()?;
    let new = new.into_inner();
    new.validate()?;
    let created = guarded(breaker, pool, move |conn| {
        query::create_ingredient(&new, Some(owner), conn)
    })
    .await?;
    invalidate_listings(cache).await?;
    Ok(HttpResponse::Created().json(created))
}

#[put("/apis/ingredients/{slug}")]
async fn update_ingredient(
    slug: web::Path<String>,
    new: web::Json<NewIngredient>,
    viewer: Viewer,
    cache: web::Data<ListingCache>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    viewer.require()?;
    let (slug, new) = (slug.into_inner(), new.into_inner());
    new.validate()?;
    let updated = guarded(breaker, pool, move |conn| {
        query::update_ingredient(&slug, &new, viewer.0, conn)
    })
    .await?;
    invalidate_listings(cache).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/apis/ingredients/{slug}")]
async fn delete_ingredient(
    slug: web::Path<String>,
    viewer: Viewer,
    cache: web::Data<ListingCache>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    viewer.require()?;
    let slug = slug.into_inner();
    guarded(breaker, pool, move |conn| {
        query::delete_ingredient(&slug, viewer.0, conn)
    })
    .await?;
    invalidate_listings(cache).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/apis/ingredients/{slug}/prices")]
async fn add_price(
    slug: web::Path<String>,
    new: web::Json<NewPrice>,
    viewer: Viewer,
    cache: web::Data<ListingCache>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    viewer.require()?;
    let (slug, new) = (slug.into_inner(), new.into_inner());
    new.validate()?;
    let added = guarded(breaker, pool, move |conn| {
        query::add_price(&slug, &new, viewer.0, conn)
    })
    .await?;
    invalidate_listings(cache).await?;
    Ok(HttpResponse::Created().json(added))
}

// Recipes

#[derive(Debug, Serialize)]
struct RecipeSummary {
    #[serde(flatten)]
    listing: RecipeListing,
    nutrition_data: NutritionData,
}

#[get("/apis/recipes")]
async fn list_recipes(
    viewer: Viewer,
    settings: web::Data<Settings>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let places = settings.nutrition.cost_decimal_places;
    let (recipes, book) = guarded(breaker, pool, move |conn| {
        let recipes = query::find_recipe_listings(viewer.0, conn)?;
        let book = query::load_recipe_book(viewer.0, places, conn)?;
        Ok((recipes, book))
    })
    .await?;

    let summaries: Vec<RecipeSummary> = recipes
        .into_iter()
        .map(|listing| RecipeSummary {
            nutrition_data: book
                .mix(listing.recipe.id)
                .nutrition_data(listing.recipe.serves, &settings.nutrition),
            listing,
        })
        .collect();
    Ok(HttpResponse::Ok().json(summaries))
}

#[derive(Debug, Serialize)]
struct RecipeDetail {
    #[serde(flatten)]
    listing: RecipeListing,
    components: Vec<RecipeLine>,
    nutrition_data: NutritionData,
}

#[get("/apis/recipes/{slug}")]
async fn recipe_detail(
    slug: web::Path<String>,
    viewer: Viewer,
    settings: web::Data<Settings>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let slug = slug.into_inner();
    let places = settings.nutrition.cost_decimal_places;
    let (listing, components, book) = guarded(breaker, pool, move |conn| {
        let listing = query::find_recipe(&slug, viewer.0, conn)?;
        let components = query::find_recipe_lines(listing.recipe.id, conn)?;
        let book = query::load_recipe_book(viewer.0, places, conn)?;
        Ok((listing, components, book))
    })
    .await?;

    let mix = book.mix(listing.recipe.id);
    debug!(
        "{} makes {:?} kg from {} lines",
        listing.recipe.slug,
        mix.mass,
        components.len()
    );
    Ok(HttpResponse::Ok().json(RecipeDetail {
        nutrition_data: mix.nutrition_data(listing.recipe.serves, &settings.nutrition),
        components,
        listing,
    }))
}

#[post("/apis/recipes")]
async fn create_recipe(
    new: web::Json<NewRecipe>,
    viewer: Viewer,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let owner = viewer.require()?;
    let new = new.into_inner();
    new.validate()?;
    let created = guarded(breaker, pool, move |conn| {
        query::create_recipe(&new, Some(owner), conn)
    })
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/apis/recipe-flags")]
async fn list_recipe_flags(
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let flags = guarded(breaker, pool, query::find_recipe_flags).await?;
    Ok(HttpResponse::Ok().json(flags))
}

// Foods

#[derive(Debug, Serialize)]
struct FoodSummary {
    #[serde(flatten)]
    food: Food,
    tags: Vec<Tag>,
}

#[get("/apis/foods")]
async fn list_foods(
    viewer: Viewer,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let foods = guarded(breaker, pool, move |conn| {
        let foods = query::find_visible_foods(viewer.0, conn)?;
        let ids: Vec<i32> = foods.iter().map(|f| f.id).collect();
        let mut tags = query::find_food_tags(&ids, conn)?;
        Ok(foods
            .into_iter()
            .map(|food| FoodSummary {
                tags: tags.remove(&food.id).unwrap_or_default(),
                food,
            })
            .collect::<Vec<_>>())
    })
    .await?;
    Ok(HttpResponse::Ok().json(foods))
}

#[derive(Debug, Serialize)]
struct FoodDetail {
    #[serde(flatten)]
    food: Food,
    tags: Vec<Tag>,
    effective_components: Vec<BaseComponent>,
    /// Per reference mass, averaged over the components for combinations.
    derived_nutrients: NutrientRecord,
    nutrition_data: NutritionData,
}

#[get("/apis/foods/{id}")]
async fn food_detail(
    id: web::Path<i32>,
    viewer: Viewer,
    settings: web::Data<Settings>,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let (food, tags, effective_components, derived_nutrients) =
        guarded(breaker, pool, move |conn| {
            let foods = query::find_visible_foods(viewer.0, conn)?;
            let catalog = query::food_catalog(&foods);
            let food = foods
                .into_iter()
                .find(|f| f.id == id)
                .ok_or_else(|| ServiceError::NotFound(format!("food {id}")))?;
            let effective = catalog.effective_components(id)?;
            let nutrients = catalog.nutrients(id)?;
            let tags = query::find_food_tags(&[id], conn)?
                .remove(&id)
                .unwrap_or_default();
            Ok((food, tags, effective, nutrients))
        })
        .await?;

    // foods carry no prices
    let nutrition_data = add_nutrition_ratios(&NutritionInput::new(
        &settings.nutrition,
        None,
        None,
        &derived_nutrients,
    ));
    Ok(HttpResponse::Ok().json(FoodDetail {
        food,
        tags,
        effective_components,
        derived_nutrients,
        nutrition_data,
    }))
}

#[post("/apis/foods")]
async fn create_food(
    new: web::Json<NewFood>,
    viewer: Viewer,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let owner = viewer.require()?;
    let new = new.into_inner();
    new.validate()?;
    let created = guarded(breaker, pool, move |conn| {
        query::create_food(&new, Some(owner), conn)
    })
    .await?;
    Ok(HttpResponse::Created().json(created))
}

// Targets

#[get("/apis/targets")]
async fn list_targets(
    viewer: Viewer,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let user = viewer.require()?;
    let targets = guarded(breaker, pool, move |conn| query::find_targets(user, conn)).await?;
    Ok(HttpResponse::Ok().json(targets))
}

#[post("/apis/targets")]
async fn create_target(
    new: web::Json<NewTarget>,
    viewer: Viewer,
    breaker: web::Data<CircuitBreakerType>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let user = viewer.require()?;
    let new = new.into_inner();
    new.validate()?;
    let created = guarded(breaker, pool, move |conn| {
        query::create_target(&new, user, conn)
    })
    .await?;
    Ok(HttpResponse::Created().json(created))
}

pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_ingredients)
        .service(ingredient_detail)
        .service(create_ingredient)
        .service(update_ingredient)
        .service(delete_ingredient)
        .service(add_price)
        .service(list_recipes)
        .service(recipe_detail)
        .service(create_recipe)
        .service(list_recipe_flags)
        .service(list_foods)
        .service(food_detail)
        .service(create_food)
        .service(list_targets)
        .service(create_target);
}
