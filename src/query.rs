use std::collections::{BTreeSet, HashMap};

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Unsigned};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::composition::{BaseComponent, Composition, FoodCatalog};
use crate::error::ServiceError;
use crate::membership::RecipeGraph;
use crate::models::{
    self, BaseComponentInsert, BaseComponentRow, Component, ComponentInsert, Food, FoodInsert,
    FoodRow, Ingredient, IngredientChanges, IngredientInsert, IngredientListing, IngredientRow,
    IngredientTag, NewFood, NewIngredient, NewPrice, NewRecipe, NewTarget, Price, PriceInsert,
    Recipe, RecipeFlag, RecipeInsert, Target, TargetBoundInsert, TargetBoundRow, TargetInsert,
    TargetRow, BOUND_MAXIMUM, BOUND_MINIMUM,
};
use crate::prices::PriceIndex;
use crate::recipe_nutrition::RecipeBook;
use crate::schema::{
    base_component, component, food, food_tags, ingredient, ingredient_tag, ingredient_tags,
    price, recipe, recipe_flag, recipe_tag, recipe_tags, tag, target, target_bound,
};

type QueryResult<T> = Result<T, ServiceError>;

no_arg_sql_function!(last_insert_id, Unsigned<BigInt>);

fn inserted_id(conn: &MysqlConnection) -> QueryResult<i32> {
    let raw: u64 = diesel::select(last_insert_id).get_result(conn)?;
    i32::try_from(raw).map_err(|_| ServiceError::Integrity(format!("row id {raw} out of range")))
}

/// Writes need a viewer, and only the owner may change a row. Global rows
/// (no owner) are read-only here.
fn ensure_owner(
    owner: Option<i32>,
    viewer: Option<i32>,
    what: &'static str,
) -> QueryResult<i32> {
    let user = viewer.ok_or(ServiceError::Unauthorized)?;
    match owner {
        Some(owner) if owner == user => Ok(user),
        _ => Err(ServiceError::Forbidden(what)),
    }
}

fn unique_names(names: &[String]) -> BTreeSet<&str> {
    names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()).collect()
}

// Ingredients

pub(crate) fn find_visible_ingredients(
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Vec<Ingredient>> {
    let query = ingredient::table
        .order(ingredient::updated_at.desc())
        .into_boxed();
    let query = match viewer {
        Some(user) => query.filter(ingredient::owner_id.is_null().or(ingredient::owner_id.eq(user))),
        None => query.filter(ingredient::owner_id.is_null()),
    };
    let rows = query.load::<IngredientRow>(conn)?;
    Ok(rows.into_iter().map(Ingredient::from).collect())
}

pub(crate) fn find_ingredient(
    slug: &str,
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Ingredient> {
    let row = ingredient::table
        .filter(ingredient::slug.eq(slug))
        .first::<IngredientRow>(conn)
        .optional()?;
    match row {
        Some(row) if row.owner_id.is_none() || row.owner_id == viewer => Ok(row.into()),
        _ => Err(ServiceError::NotFound(format!("ingredient {slug}"))),
    }
}

pub(crate) fn find_prices(
    ingredient_ids: &[i32],
    conn: &MysqlConnection,
) -> QueryResult<HashMap<i32, Vec<Price>>> {
    let prices = price::table
        .filter(price::ingredient_id.eq_any(ingredient_ids))
        .load::<Price>(conn)?;
    let mut grouped: HashMap<i32, Vec<Price>> = HashMap::new();
    for p in prices {
        grouped.entry(p.ingredient_id).or_default().push(p);
    }
    Ok(grouped)
}

pub(crate) fn find_ingredient_tags(
    ingredient_ids: &[i32],
    conn: &MysqlConnection,
) -> QueryResult<HashMap<i32, Vec<IngredientTag>>> {
    let rows = ingredient_tags::table
        .inner_join(ingredient_tag::table)
        .filter(ingredient_tags::ingredient_id.eq_any(ingredient_ids))
        .order(ingredient_tag::name.asc())
        .select((
            ingredient_tags::ingredient_id,
            (ingredient_tag::id, ingredient_tag::name, ingredient_tag::description),
        ))
        .load::<(i32, IngredientTag)>(conn)?;
    let mut grouped: HashMap<i32, Vec<IngredientTag>> = HashMap::new();
    for (ingredient_id, t) in rows {
        grouped.entry(ingredient_id).or_default().push(t);
    }
    Ok(grouped)
}

/// Visible ingredients, newest edit first, each with its tags and best price.
pub(crate) fn find_ingredient_listings(
    viewer: Option<i32>,
    decimal_places: u32,
    conn: &MysqlConnection,
) -> QueryResult<Vec<IngredientListing>> {
    let ingredients = find_visible_ingredients(viewer, conn)?;
    let ids: Vec<i32> = ingredients.iter().map(|i| i.id).collect();
    let mut prices = find_prices(&ids, conn)?;
    let mut tags = find_ingredient_tags(&ids, conn)?;

    Ok(ingredients
        .into_iter()
        .map(|i| {
            let index = PriceIndex::new(prices.remove(&i.id).unwrap_or_default());
            IngredientListing {
                tags: tags
                    .remove(&i.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|t| t.name)
                    .collect(),
                best_price: index.best_price(decimal_places),
                ingredient: i,
            }
        })
        .collect())
}

fn ingredient_tag_ids(names: &[String], conn: &MysqlConnection) -> QueryResult<Vec<i32>> {
    let mut ids = Vec::new();
    for tag_name in unique_names(names) {
        let existing = ingredient_tag::table
            .filter(ingredient_tag::name.eq(tag_name))
            .select(ingredient_tag::id)
            .first::<i32>(conn)
            .optional()?;
        let tag_id = match existing {
            Some(tag_id) => tag_id,
            None => {
                diesel::insert_into(ingredient_tag::table)
                    .values((
                        ingredient_tag::name.eq(tag_name),
                        ingredient_tag::description.eq(""),
                    ))
                    .execute(conn)?;
                inserted_id(conn)?
            }
        };
        ids.push(tag_id);
    }
    Ok(ids)
}

fn replace_ingredient_tags(
    ingredient_id: i32,
    names: &[String],
    conn: &MysqlConnection,
) -> QueryResult<()> {
    diesel::delete(ingredient_tags::table.filter(ingredient_tags::ingredient_id.eq(ingredient_id)))
        .execute(conn)?;
    let links: Vec<_> = ingredient_tag_ids(names, conn)?
        .into_iter()
        .map(|tag_id| {
            (
                ingredient_tags::ingredient_id.eq(ingredient_id),
                ingredient_tags::ingredient_tag_id.eq(tag_id),
            )
        })
        .collect();
    if !links.is_empty() {
        diesel::insert_into(ingredient_tags::table)
            .values(&links)
            .execute(conn)?;
    }
    Ok(())
}

pub(crate) fn create_ingredient(
    new: &NewIngredient,
    owner_id: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Ingredient> {
    let insert = IngredientInsert::new(new, owner_id);
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(ingredient::table)
            .values(&insert)
            .execute(conn)
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => ServiceError::Conflict(format!(
                    "an ingredient named {:?} or with slug {:?}",
                    new.name, insert.slug
                )),
                other => other,
            })?;
        let row = ingredient::table
            .filter(ingredient::slug.eq(&insert.slug))
            .first::<IngredientRow>(conn)?;
        replace_ingredient_tags(row.id, &new.tags, conn)?;
        Ok(row.into())
    })
}

pub(crate) fn update_ingredient(
    slug: &str,
    new: &NewIngredient,
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Ingredient> {
    conn.transaction::<_, ServiceError, _>(|| {
        let existing = find_ingredient(slug, viewer, conn)?;
        ensure_owner(existing.owner_id, viewer, "ingredient")?;
        diesel::update(ingredient::table.find(existing.id))
            .set(&IngredientChanges::from(new))
            .execute(conn)?;
        replace_ingredient_tags(existing.id, &new.tags, conn)?;
        let row = ingredient::table
            .find(existing.id)
            .first::<IngredientRow>(conn)?;
        Ok(row.into())
    })
}

/// Removes the ingredient with its prices, tag links and recipe lines.
pub(crate) fn delete_ingredient(
    slug: &str,
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<()> {
    conn.transaction::<_, ServiceError, _>(|| {
        let existing = find_ingredient(slug, viewer, conn)?;
        ensure_owner(existing.owner_id, viewer, "ingredient")?;
        diesel::delete(price::table.filter(price::ingredient_id.eq(existing.id))).execute(conn)?;
        diesel::delete(ingredient_tags::table.filter(ingredient_tags::ingredient_id.eq(existing.id)))
            .execute(conn)?;
        diesel::delete(component::table.filter(component::of_ingredient_id.eq(existing.id)))
            .execute(conn)?;
        diesel::delete(ingredient::table.find(existing.id)).execute(conn)?;
        Ok(())
    })
}

pub(crate) fn add_price(
    slug: &str,
    new: &NewPrice,
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Price> {
    conn.transaction::<_, ServiceError, _>(|| {
        let existing = find_ingredient(slug, viewer, conn)?;
        ensure_owner(existing.owner_id, viewer, "ingredient")?;
        diesel::insert_into(price::table)
            .values(&PriceInsert {
                ingredient_id: existing.id,
                amount: new.amount,
                weight: new.weight,
                notes: &new.notes,
            })
            .execute(conn)?;
        let id = inserted_id(conn)?;
        Ok(price::table.find(id).first::<Price>(conn)?)
    })
}

// Recipes

fn find_visible_recipes(viewer: Option<i32>, conn: &MysqlConnection) -> QueryResult<Vec<Recipe>> {
    let query = recipe::table.order(recipe::name.asc()).into_boxed();
    let query = match viewer {
        Some(user) => query.filter(recipe::owner_id.is_null().or(recipe::owner_id.eq(user))),
        None => query.filter(recipe::owner_id.is_null()),
    };
    Ok(query.load::<Recipe>(conn)?)
}

fn find_components_of(recipes: &[Recipe], conn: &MysqlConnection) -> QueryResult<Vec<Component>> {
    let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    Ok(component::table
        .filter(component::in_recipe_id.eq_any(&ids))
        .order(component::id.asc())
        .load::<Component>(conn)?)
}

/// Loads every visible recipe and its lines so membership can be walked in memory.
pub(crate) fn load_recipe_graph(
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<RecipeGraph> {
    let recipes = find_visible_recipes(viewer, conn)?;
    let components = find_components_of(&recipes, conn)?;
    Ok(RecipeGraph::new(&recipes, &components))
}

/// Visible recipe lines plus the nutrients and best price of every visible
/// ingredient, enough to work out recipe nutrition in memory.
pub(crate) fn load_recipe_book(
    viewer: Option<i32>,
    decimal_places: u32,
    conn: &MysqlConnection,
) -> QueryResult<RecipeBook> {
    let recipes = find_visible_recipes(viewer, conn)?;
    let components = find_components_of(&recipes, conn)?;
    let ingredients = find_ingredient_listings(viewer, decimal_places, conn)?;
    Ok(RecipeBook::new(
        ingredients
            .into_iter()
            .map(|l| (l.ingredient.id, l.ingredient.nutrients, l.best_price)),
        &components,
    ))
}

#[derive(Debug, Serialize)]
pub(crate) struct RecipeListing {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub tags: Vec<String>,
    pub flag: Option<String>,
}

fn find_recipe_tag_names(
    recipe_ids: &[i32],
    conn: &MysqlConnection,
) -> QueryResult<HashMap<i32, Vec<String>>> {
    let mut tags: HashMap<i32, Vec<String>> = HashMap::new();
    for (recipe_id, tag_name) in recipe_tags::table
        .inner_join(recipe_tag::table)
        .filter(recipe_tags::recipe_id.eq_any(recipe_ids))
        .order(recipe_tag::name.asc())
        .select((recipe_tags::recipe_id, recipe_tag::name))
        .load::<(i32, String)>(conn)?
    {
        tags.entry(recipe_id).or_default().push(tag_name);
    }
    Ok(tags)
}

fn recipe_flag_names(conn: &MysqlConnection) -> QueryResult<HashMap<i32, String>> {
    Ok(find_recipe_flags(conn)?
        .into_iter()
        .map(|f| (f.id, f.name))
        .collect())
}

pub(crate) fn find_recipe_listings(
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Vec<RecipeListing>> {
    let recipes = find_visible_recipes(viewer, conn)?;
    let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut tags = find_recipe_tag_names(&ids, conn)?;
    let flags = recipe_flag_names(conn)?;

    Ok(recipes
        .into_iter()
        .map(|r| RecipeListing {
            tags: tags.remove(&r.id).unwrap_or_default(),
            flag: r.flag_id.and_then(|flag_id| flags.get(&flag_id).cloned()),
            recipe: r,
        })
        .collect())
}

pub(crate) fn find_recipe(
    slug: &str,
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<RecipeListing> {
    let found = recipe::table
        .filter(recipe::slug.eq(slug))
        .first::<Recipe>(conn)
        .optional()?;
    let recipe = match found {
        Some(r) if r.owner_id.is_none() || r.owner_id == viewer => r,
        _ => return Err(ServiceError::NotFound(format!("recipe {slug}"))),
    };
    let tags = find_recipe_tag_names(&[recipe.id], conn)?
        .remove(&recipe.id)
        .unwrap_or_default();
    let flag = match recipe.flag_id {
        Some(flag_id) => recipe_flag::table
            .find(flag_id)
            .select(recipe_flag::name)
            .first::<String>(conn)
            .optional()?,
        None => None,
    };
    Ok(RecipeListing { recipe, tags, flag })
}

/// One line of a recipe, naming what it uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RecipeLine {
    pub id: i32,
    /// Ingredient slug.
    pub of_ingredient: Option<String>,
    /// Recipe slug.
    pub of_recipe: Option<String>,
    pub name: String,
    /// Kilograms.
    pub quantity: Option<Decimal>,
    pub note: String,
}

pub(crate) fn find_recipe_lines(
    recipe_id: i32,
    conn: &MysqlConnection,
) -> QueryResult<Vec<RecipeLine>> {
    let lines = component::table
        .filter(component::in_recipe_id.eq(recipe_id))
        .order(component::id.asc())
        .load::<Component>(conn)?;
    let ingredient_ids: Vec<i32> = lines.iter().filter_map(|l| l.of_ingredient_id).collect();
    let recipe_ids: Vec<i32> = lines.iter().filter_map(|l| l.of_recipe_id).collect();

    let ingredients: HashMap<i32, (String, String)> = ingredient::table
        .filter(ingredient::id.eq_any(&ingredient_ids))
        .select((ingredient::id, ingredient::slug, ingredient::name))
        .load::<(i32, String, String)>(conn)?
        .into_iter()
        .map(|(id, slug, name)| (id, (slug, name)))
        .collect();
    let recipes: HashMap<i32, (String, String)> = recipe::table
        .filter(recipe::id.eq_any(&recipe_ids))
        .select((recipe::id, recipe::slug, recipe::name))
        .load::<(i32, String, String)>(conn)?
        .into_iter()
        .map(|(id, slug, name)| (id, (slug, name)))
        .collect();

    lines
        .into_iter()
        .map(|line| -> QueryResult<RecipeLine> {
            let (of_ingredient, of_recipe, name) = match (line.of_ingredient_id, line.of_recipe_id) {
                (Some(id), None) => ingredients
                    .get(&id)
                    .map(|(slug, name)| (Some(slug.clone()), None, name.clone())),
                (None, Some(id)) => recipes
                    .get(&id)
                    .map(|(slug, name)| (None, Some(slug.clone()), name.clone())),
                _ => None,
            }
            .ok_or_else(|| {
                ServiceError::Integrity(format!(
                    "recipe {recipe_id} line {} points at nothing usable",
                    line.id
                ))
            })?;
            Ok(RecipeLine {
                id: line.id,
                of_ingredient,
                of_recipe,
                name,
                quantity: line.quantity,
                note: line.note,
            })
        })
        .collect()
}

pub(crate) fn find_recipe_flags(conn: &MysqlConnection) -> QueryResult<Vec<RecipeFlag>> {
    Ok(recipe_flag::table
        .order(recipe_flag::name.asc())
        .load::<RecipeFlag>(conn)?)
}

fn recipe_tag_ids(names: &[String], conn: &MysqlConnection) -> QueryResult<Vec<i32>> {
    let mut ids = Vec::new();
    for tag_name in unique_names(names) {
        let existing = recipe_tag::table
            .filter(recipe_tag::name.eq(tag_name))
            .select(recipe_tag::id)
            .first::<i32>(conn)
            .optional()?;
        let tag_id = match existing {
            Some(tag_id) => tag_id,
            None => {
                diesel::insert_into(recipe_tag::table)
                    .values(recipe_tag::name.eq(tag_name))
                    .execute(conn)?;
                inserted_id(conn)?
            }
        };
        ids.push(tag_id);
    }
    Ok(ids)
}

/// Creates the recipe, its lines and its tags in one transaction.
pub(crate) fn create_recipe(
    new: &NewRecipe,
    owner_id: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Recipe> {
    conn.transaction::<_, ServiceError, _>(|| {
        let flag_id = match &new.flag {
            Some(flag_name) => Some(
                recipe_flag::table
                    .filter(recipe_flag::name.eq(flag_name))
                    .select(recipe_flag::id)
                    .first::<i32>(conn)
                    .optional()?
                    .ok_or_else(|| {
                        ServiceError::Validation(format!("unknown recipe flag {flag_name:?}"))
                    })?,
            ),
            None => None,
        };

        let slug = models::slugify(&new.name);
        diesel::insert_into(recipe::table)
            .values(&RecipeInsert {
                name: &new.name,
                slug: slug.clone(),
                owner_id,
                description: &new.description,
                introduction: &new.introduction,
                method: &new.method,
                notes: &new.notes,
                serves: new.serves,
                flag_id,
            })
            .execute(conn)?;
        let created = recipe::table
            .filter(recipe::slug.eq(&slug))
            .first::<Recipe>(conn)?;

        let mut lines = Vec::with_capacity(new.components.len());
        for line in &new.components {
            let (of_ingredient_id, of_recipe_id) = match (&line.of_ingredient, &line.of_recipe) {
                (Some(ingredient_slug), None) => {
                    (Some(find_ingredient(ingredient_slug, owner_id, conn)?.id), None)
                }
                (None, Some(recipe_slug)) => {
                    let sub = find_visible_recipes(owner_id, conn)?
                        .into_iter()
                        .find(|r| &r.slug == recipe_slug)
                        .ok_or_else(|| ServiceError::NotFound(format!("recipe {recipe_slug}")))?;
                    (None, Some(sub.id))
                }
                _ => {
                    return Err(ServiceError::Validation(
                        "a component names exactly one ingredient or recipe".to_string(),
                    ))
                }
            };
            lines.push(ComponentInsert {
                in_recipe_id: created.id,
                of_ingredient_id,
                of_recipe_id,
                quantity: line.quantity,
                note: &line.note,
            });
        }
        if !lines.is_empty() {
            diesel::insert_into(component::table)
                .values(&lines)
                .execute(conn)?;
        }

        let links: Vec<_> = recipe_tag_ids(&new.tags, conn)?
            .into_iter()
            .map(|tag_id| {
                (
                    recipe_tags::recipe_id.eq(created.id),
                    recipe_tags::recipe_tag_id.eq(tag_id),
                )
            })
            .collect();
        if !links.is_empty() {
            diesel::insert_into(recipe_tags::table)
                .values(&links)
                .execute(conn)?;
        }
        Ok(created)
    })
}

// Foods

pub(crate) fn find_visible_foods(
    viewer: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Vec<Food>> {
    let query = food::table.order(food::name.asc()).into_boxed();
    let query = match viewer {
        Some(user) => query.filter(food::owner_id.is_null().or(food::owner_id.eq(user))),
        None => query.filter(food::owner_id.is_null()),
    };
    let rows = query.load::<FoodRow>(conn)?;
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let mut components: HashMap<i32, Vec<BaseComponent>> = HashMap::new();
    for row in base_component::table
        .filter(base_component::recipe_id.eq_any(&ids))
        .order(base_component::id.asc())
        .load::<BaseComponentRow>(conn)?
    {
        components
            .entry(row.recipe_id)
            .or_default()
            .push(row.into());
    }

    rows.into_iter()
        .map(|row| {
            let own = components.remove(&row.id).unwrap_or_default();
            row.into_food(own)
        })
        .collect()
}

pub(crate) fn food_catalog(foods: &[Food]) -> FoodCatalog {
    FoodCatalog::new(
        foods
            .iter()
            .map(|f| (f.id, f.nutrients.clone(), f.composition.clone())),
    )
}

pub(crate) fn find_food_tags(
    food_ids: &[i32],
    conn: &MysqlConnection,
) -> QueryResult<HashMap<i32, Vec<models::Tag>>> {
    let rows = food_tags::table
        .inner_join(tag::table)
        .filter(food_tags::food_id.eq_any(food_ids))
        .order(tag::name.asc())
        .select((
            food_tags::food_id,
            (tag::id, tag::name, tag::description, tag::color, tag::icon),
        ))
        .load::<(i32, models::Tag)>(conn)?;
    let mut grouped: HashMap<i32, Vec<models::Tag>> = HashMap::new();
    for (food_id, t) in rows {
        grouped.entry(food_id).or_default().push(t);
    }
    Ok(grouped)
}

fn food_tag_ids(names: &[String], conn: &MysqlConnection) -> QueryResult<Vec<i32>> {
    let mut ids = Vec::new();
    for tag_name in unique_names(names) {
        let existing = tag::table
            .filter(tag::name.eq(tag_name))
            .select(tag::id)
            .first::<i32>(conn)
            .optional()?;
        let tag_id = match existing {
            Some(tag_id) => tag_id,
            None => {
                diesel::insert_into(tag::table)
                    .values((
                        tag::name.eq(tag_name),
                        tag::description.eq(""),
                        tag::color.eq(""),
                        tag::icon.eq(""),
                    ))
                    .execute(conn)?;
                inserted_id(conn)?
            }
        };
        ids.push(tag_id);
    }
    Ok(ids)
}

/// Creates a food. Every referenced food must already be visible to the owner.
pub(crate) fn create_food(
    new: &NewFood,
    owner_id: Option<i32>,
    conn: &MysqlConnection,
) -> QueryResult<Food> {
    conn.transaction::<_, ServiceError, _>(|| {
        let catalog = food_catalog(&find_visible_foods(owner_id, conn)?);
        for component in new.composition.own_components() {
            if !catalog.contains(component.component_id) {
                return Err(crate::composition::CompositionError::UnknownFood(
                    component.component_id,
                )
                .into());
            }
        }
        if let Composition::Extension { parent_id, .. } = &new.composition {
            // the parent must itself resolve to a component list
            catalog.effective_components(*parent_id)?;
        }

        diesel::insert_into(food::table)
            .values(&FoodInsert::new(new, owner_id))
            .execute(conn)?;
        let food_id = inserted_id(conn)?;

        let lines: Vec<BaseComponentInsert> = new
            .composition
            .own_components()
            .iter()
            .map(|c| BaseComponentInsert {
                recipe_id: food_id,
                component_id: c.component_id,
                amount: c.amount,
                note: &c.note,
            })
            .collect();
        if !lines.is_empty() {
            diesel::insert_into(base_component::table)
                .values(&lines)
                .execute(conn)?;
        }

        let links: Vec<_> = food_tag_ids(&new.tags, conn)?
            .into_iter()
            .map(|tag_id| (food_tags::food_id.eq(food_id), food_tags::tag_id.eq(tag_id)))
            .collect();
        if !links.is_empty() {
            diesel::insert_into(food_tags::table)
                .values(&links)
                .execute(conn)?;
        }

        let row = food::table.find(food_id).first::<FoodRow>(conn)?;
        let own = new.composition.own_components().to_vec();
        row.into_food(own)
    })
}

// Targets

pub(crate) fn find_targets(user_id: i32, conn: &MysqlConnection) -> QueryResult<Vec<Target>> {
    let targets = target::table
        .filter(target::user_id.eq(user_id))
        .order(target::name.asc())
        .load::<TargetRow>(conn)?;
    let ids: Vec<i32> = targets.iter().map(|t| t.id).collect();
    let bounds = target_bound::table
        .filter(target_bound::of_target_id.eq_any(&ids))
        .load::<TargetBoundRow>(conn)?;

    Ok(targets
        .into_iter()
        .map(|t| {
            let bound = |kind: &str| {
                bounds
                    .iter()
                    .find(|b| b.of_target_id == t.id && b.bound == kind)
                    .map(TargetBoundRow::nutrients)
                    .unwrap_or_default()
            };
            Target {
                minimum: bound(BOUND_MINIMUM),
                maximum: bound(BOUND_MAXIMUM),
                id: t.id,
                name: t.name,
                description: t.description,
            }
        })
        .collect())
}

/// Creates the target with both of its bounds, or nothing at all.
pub(crate) fn create_target(
    new: &NewTarget,
    user_id: i32,
    conn: &MysqlConnection,
) -> QueryResult<Target> {
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(target::table)
            .values(&TargetInsert {
                user_id,
                name: &new.name,
                description: &new.description,
            })
            .execute(conn)?;
        let target_id = inserted_id(conn)?;
        diesel::insert_into(target_bound::table)
            .values(&vec![
                TargetBoundInsert::new(target_id, BOUND_MINIMUM, &new.minimum),
                TargetBoundInsert::new(target_id, BOUND_MAXIMUM, &new.maximum),
            ])
            .execute(conn)?;
        Ok(Target {
            id: target_id,
            name: new.name.clone(),
            description: new.description.clone(),
            minimum: new.minimum.clone(),
            maximum: new.maximum.clone(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owners_may_write_their_own_rows_only() {
        assert_eq!(ensure_owner(Some(3), Some(3), "ingredient").unwrap(), 3);
        assert!(matches!(
            ensure_owner(Some(3), None, "ingredient"),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            ensure_owner(Some(3), Some(4), "ingredient"),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_owner(None, Some(4), "ingredient"),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn tag_names_are_deduplicated() {
        let names = vec![
            "grain".to_string(),
            " grain ".to_string(),
            "".to_string(),
            "legume".to_string(),
        ];
        let unique: Vec<&str> = unique_names(&names).into_iter().collect();
        assert_eq!(unique, vec!["grain", "legume"]);
    }
}
