table! {
    ingredient (id) {
        id -> Integer,
        name -> Varchar,
        slug -> Varchar,
        description -> Varchar,
        owner_id -> Nullable<Integer>,
        serving -> Nullable<Numeric>,
        introduction -> Text,
        notes -> Text,
        energy -> Nullable<Numeric>,
        protein -> Nullable<Numeric>,
        fibre -> Nullable<Numeric>,
        carbohydrate -> Nullable<Numeric>,
        fat -> Nullable<Numeric>,
        sugar -> Nullable<Numeric>,
        saturated_fat -> Nullable<Numeric>,
        sodium -> Nullable<Numeric>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    ingredient_tag (id) {
        id -> Integer,
        name -> Varchar,
        description -> Varchar,
    }
}

table! {
    ingredient_tags (ingredient_id, ingredient_tag_id) {
        ingredient_id -> Integer,
        ingredient_tag_id -> Integer,
    }
}

table! {
    price (id) {
        id -> Integer,
        ingredient_id -> Integer,
        amount -> Numeric,
        weight -> Numeric,
        notes -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    recipe_flag (id) {
        id -> Integer,
        name -> Varchar,
        description -> Varchar,
    }
}

table! {
    recipe (id) {
        id -> Integer,
        name -> Varchar,
        slug -> Varchar,
        owner_id -> Nullable<Integer>,
        description -> Varchar,
        introduction -> Text,
        method -> Text,
        notes -> Text,
        serves -> Nullable<Numeric>,
        flag_id -> Nullable<Integer>,
    }
}

table! {
    recipe_tag (id) {
        id -> Integer,
        name -> Varchar,
    }
}

table! {
    recipe_tags (recipe_id, recipe_tag_id) {
        recipe_id -> Integer,
        recipe_tag_id -> Integer,
    }
}

table! {
    component (id) {
        id -> Integer,
        in_recipe_id -> Integer,
        of_ingredient_id -> Nullable<Integer>,
        of_recipe_id -> Nullable<Integer>,
        quantity -> Nullable<Numeric>,
        note -> Varchar,
    }
}

table! {
    tag (id) {
        id -> Integer,
        name -> Varchar,
        description -> Varchar,
        color -> Varchar,
        icon -> Varchar,
    }
}

table! {
    food (id) {
        id -> Integer,
        name -> Varchar,
        description -> Varchar,
        owner_id -> Nullable<Integer>,
        introduction -> Text,
        notes -> Text,
        composition -> Varchar,
        parent_food_id -> Nullable<Integer>,
        energy -> Nullable<Numeric>,
        protein -> Nullable<Numeric>,
        fibre -> Nullable<Numeric>,
        carbohydrate -> Nullable<Numeric>,
        fat -> Nullable<Numeric>,
        sugar -> Nullable<Numeric>,
        saturated_fat -> Nullable<Numeric>,
        sodium -> Nullable<Numeric>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    food_tags (food_id, tag_id) {
        food_id -> Integer,
        tag_id -> Integer,
    }
}

table! {
    base_component (id) {
        id -> Integer,
        recipe_id -> Integer,
        component_id -> Integer,
        amount -> Nullable<Numeric>,
        note -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    target (id) {
        id -> Integer,
        user_id -> Integer,
        name -> Varchar,
        description -> Varchar,
    }
}

table! {
    target_bound (id) {
        id -> Integer,
        of_target_id -> Integer,
        bound -> Varchar,
        energy -> Nullable<Numeric>,
        protein -> Nullable<Numeric>,
        fibre -> Nullable<Numeric>,
        carbohydrate -> Nullable<Numeric>,
        fat -> Nullable<Numeric>,
        sugar -> Nullable<Numeric>,
        saturated_fat -> Nullable<Numeric>,
        sodium -> Nullable<Numeric>,
    }
}

joinable!(price -> ingredient (ingredient_id));
joinable!(ingredient_tags -> ingredient (ingredient_id));
joinable!(ingredient_tags -> ingredient_tag (ingredient_tag_id));
joinable!(recipe_tags -> recipe (recipe_id));
joinable!(recipe_tags -> recipe_tag (recipe_tag_id));
joinable!(food_tags -> food (food_id));
joinable!(food_tags -> tag (tag_id));
joinable!(target_bound -> target (of_target_id));

allow_tables_to_appear_in_same_query!(
    ingredient,
    ingredient_tag,
    ingredient_tags,
    price,
    recipe_flag,
    recipe,
    recipe_tag,
    recipe_tags,
    component,
    tag,
    food,
    food_tags,
    base_component,
    target,
    target_bound,
);
