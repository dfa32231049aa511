use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use serde::Serialize;

use crate::models::{Component, Recipe};

/// In-memory view of which recipes contain which ingredients and sub-recipes.
///
/// Built from the recipes visible to one viewer and their components. Any
/// component pointing at a recipe outside that set is ignored.
#[derive(Debug, Default)]
pub(crate) struct RecipeGraph {
    names: HashMap<i32, (String, String)>,
    containing_ingredient: HashMap<i32, BTreeSet<i32>>,
    containing_recipe: HashMap<i32, BTreeSet<i32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Membership {
    /// Recipe slug to recipe name.
    pub recipes: BTreeMap<String, String>,
    pub generations: usize,
}

impl RecipeGraph {
    pub(crate) fn new(recipes: &[Recipe], components: &[Component]) -> Self {
        let names: HashMap<i32, (String, String)> = recipes
            .iter()
            .map(|recipe| (recipe.id, (recipe.slug.clone(), recipe.name.clone())))
            .collect();

        let mut graph = Self {
            names,
            ..Default::default()
        };
        for component in components {
            if !graph.names.contains_key(&component.in_recipe_id) {
                continue;
            }
            if let Some(ingredient_id) = component.of_ingredient_id {
                graph
                    .containing_ingredient
                    .entry(ingredient_id)
                    .or_default()
                    .insert(component.in_recipe_id);
            }
            if let Some(recipe_id) = component.of_recipe_id {
                graph
                    .containing_recipe
                    .entry(recipe_id)
                    .or_default()
                    .insert(component.in_recipe_id);
            }
        }
        graph
    }

    /// Every recipe that uses the ingredient, directly or through sub-recipes.
    ///
    /// Walks one nesting level per step. A recipe is only ever expanded once,
    /// so the walk ends even if recipes contain each other.
    pub(crate) fn used_in_recipes(&self, ingredient_id: i32) -> Membership {
        let mut seen: HashSet<i32> = HashSet::new();
        let mut generation: Vec<i32> = self
            .containing_ingredient
            .get(&ingredient_id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut membership = Membership::default();
        while !generation.is_empty() {
            membership.generations += 1;
            for id in &generation {
                if let Some((slug, name)) = self.names.get(id) {
                    membership.recipes.insert(slug.clone(), name.clone());
                }
            }

            let mut revisited = 0;
            let mut next = Vec::new();
            for parent in generation
                .iter()
                .filter_map(|id| self.containing_recipe.get(id))
                .flatten()
            {
                if seen.insert(*parent) {
                    next.push(*parent);
                } else {
                    revisited += 1;
                }
            }
            if revisited > 0 {
                debug!(
                    "ingredient {ingredient_id}: {revisited} recipe(s) reached again in generation {}",
                    membership.generations + 1
                );
            }
            generation = next;
        }
        membership
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn recipe(id: i32, name: &str) -> Recipe {
        Recipe {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            owner_id: None,
            description: String::new(),
            introduction: String::new(),
            method: String::new(),
            notes: String::new(),
            serves: None,
            flag_id: None,
        }
    }

    fn uses_ingredient(id: i32, in_recipe_id: i32, ingredient_id: i32) -> Component {
        Component {
            id,
            in_recipe_id,
            of_ingredient_id: Some(ingredient_id),
            of_recipe_id: None,
            quantity: None,
            note: String::new(),
        }
    }

    fn uses_recipe(id: i32, in_recipe_id: i32, recipe_id: i32) -> Component {
        Component {
            id,
            in_recipe_id,
            of_ingredient_id: None,
            of_recipe_id: Some(recipe_id),
            quantity: None,
            note: String::new(),
        }
    }

    fn slugs(membership: &Membership) -> Vec<&str> {
        membership.recipes.keys().map(String::as_str).collect()
    }

    #[test]
    fn unused_ingredient() {
        let graph = RecipeGraph::new(&[recipe(1, "Porridge")], &[uses_ingredient(1, 1, 7)]);
        let membership = graph.used_in_recipes(99);
        assert!(membership.recipes.is_empty());
        assert_eq!(membership.generations, 0);
    }

    #[test]
    fn nested_recipes_are_found() {
        let recipes = [recipe(1, "Dough"), recipe(2, "Pizza"), recipe(3, "Salad")];
        let components = [
            uses_ingredient(1, 1, 7),
            uses_recipe(2, 2, 1),
            uses_ingredient(3, 3, 8),
        ];
        let graph = RecipeGraph::new(&recipes, &components);

        let membership = graph.used_in_recipes(7);
        assert_eq!(slugs(&membership), vec!["dough", "pizza"]);
        assert_eq!(membership.recipes["pizza"], "Pizza");
        assert_eq!(membership.generations, 2);

        assert_eq!(graph.used_in_recipes(7), membership);
    }

    #[test]
    fn generations_follow_nesting_depth_not_recipe_count() {
        let mut recipes = vec![recipe(1, "Base")];
        let mut components = vec![uses_ingredient(1, 1, 7)];
        // ten recipes that all use Base directly
        for id in 2..12 {
            recipes.push(recipe(id, &format!("Dish {id}")));
            components.push(uses_recipe(id, id, 1));
        }
        let graph = RecipeGraph::new(&recipes, &components);

        let membership = graph.used_in_recipes(7);
        assert_eq!(membership.recipes.len(), 11);
        assert_eq!(membership.generations, 2);
    }

    #[test]
    fn diamond_is_reported_once() {
        let recipes = [
            recipe(1, "Stock"),
            recipe(2, "Gravy"),
            recipe(3, "Soup"),
            recipe(4, "Roast Dinner"),
        ];
        let components = [
            uses_ingredient(1, 1, 7),
            uses_recipe(2, 2, 1),
            uses_recipe(3, 3, 1),
            uses_recipe(4, 4, 2),
            uses_recipe(5, 4, 3),
        ];
        let graph = RecipeGraph::new(&recipes, &components);

        let membership = graph.used_in_recipes(7);
        assert_eq!(slugs(&membership), vec!["gravy", "roast-dinner", "soup", "stock"]);
        assert_eq!(membership.generations, 3);
    }

    #[test]
    fn cyclic_recipes_terminate() {
        let recipes = [recipe(1, "Alpha"), recipe(2, "Beta")];
        let components = [
            uses_ingredient(1, 1, 7),
            uses_recipe(2, 2, 1),
            uses_recipe(3, 1, 2),
        ];
        let graph = RecipeGraph::new(&recipes, &components);

        let membership = graph.used_in_recipes(7);
        assert_eq!(slugs(&membership), vec!["alpha", "beta"]);
        assert_eq!(membership.generations, 2);
    }

    #[test]
    fn self_containing_recipe_terminates() {
        let recipes = [recipe(1, "Sourdough Starter")];
        let components = [uses_ingredient(1, 1, 7), uses_recipe(2, 1, 1)];
        let graph = RecipeGraph::new(&recipes, &components);

        assert_eq!(slugs(&graph.used_in_recipes(7)), vec!["sourdough-starter"]);
    }

    #[test]
    fn invisible_recipes_are_skipped() {
        // recipe 2 belongs to someone else and was not loaded
        let recipes = [recipe(1, "Dough")];
        let components = [uses_ingredient(1, 1, 7), uses_recipe(2, 2, 1)];
        let graph = RecipeGraph::new(&recipes, &components);

        assert_eq!(slugs(&graph.used_in_recipes(7)), vec!["dough"]);
    }
}
