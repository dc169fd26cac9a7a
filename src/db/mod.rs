pub mod seed;

use crate::domain::answer::{AnswerShape, AnswerValue};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl TryFrom<&str> for Gender {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Meal,
    Exercise,
    Sleep,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub hash: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_family: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Question {
    pub id: i32,
    pub prompt: String,
    pub category: QuestionCategory,
    pub answer_type: AnswerShape,
    pub is_necessary: bool,
    pub choices: Vec<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct MealQuestion {
    pub id: i32,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SleepQuestion {
    pub id: i32,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Vegetable {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub variety: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct AnswerRow {
    pub id: i64,
    pub user_id: Uuid,
    pub question_id: Option<i32>,
    pub vegetable_id: Option<i32>,
    pub is_allergy: bool,
    pub is_unnecessary: bool,
    pub answer_type: AnswerShape,
    pub answer_choice: Option<String>,
    pub answer_int: Option<i64>,
    pub answer_bool: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub answered_on: NaiveDate,
}

#[derive(Debug, Clone, FromRow)]
pub struct MealAnswerRow {
    pub id: i64,
    pub user_id: Uuid,
    pub meal_question_id: Option<i32>,
    pub vegetable_id: Option<i32>,
    pub is_allergy: bool,
    pub answer_type: AnswerShape,
    pub answer_choice: Option<String>,
    pub answer_int: Option<i64>,
    pub answer_bool: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub answered_on: NaiveDate,
}

#[derive(Debug, Clone, FromRow)]
pub struct SleepAnswerRow {
    pub id: i64,
    pub user_id: Uuid,
    pub sleep_question_id: Option<i32>,
    pub answer_type: AnswerShape,
    pub answer_choice: Option<String>,
    pub answer_int: Option<i64>,
    pub answer_bool: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub answered_on: NaiveDate,
}

// ========== Users ==========

const USER_COLUMNS: &str = "id, email, hash, first_name, last_name, gender, \
     is_active, is_staff, is_family, is_superuser, created_at";

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<DbUser>, sqlx::Error> {
    sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DbUser>, sqlx::Error> {
    sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    hash: &str,
    first_name: &str,
    last_name: &str,
    gender: Gender,
) -> Result<DbUser, sqlx::Error> {
    sqlx::query_as::<_, DbUser>(&format!(
        r#"
        INSERT INTO users (id, email, hash, first_name, last_name, gender)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(hash)
    .bind(first_name)
    .bind(last_name)
    .bind(gender)
    .fetch_one(pool)
    .await
}

pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    email: &str,
    first_name: &str,
    last_name: &str,
    gender: Gender,
    hash: Option<&str>,
) -> Result<DbUser, sqlx::Error> {
    sqlx::query_as::<_, DbUser>(&format!(
        r#"
        UPDATE users
        SET email = $2,
            first_name = $3,
            last_name = $4,
            gender = $5,
            hash = COALESCE($6, hash),
            updated_at = now()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(gender)
    .bind(hash)
    .fetch_one(pool)
    .await
}

// ========== Question catalogs ==========

pub async fn list_questions(pool: &PgPool) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, prompt, category, answer_type, is_necessary, choices
        FROM questions
        ORDER BY id DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn find_question(pool: &PgPool, id: i32) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, prompt, category, answer_type, is_necessary, choices
        FROM questions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_meal_questions(pool: &PgPool) -> Result<Vec<MealQuestion>, sqlx::Error> {
    sqlx::query_as::<_, MealQuestion>(
        "SELECT id, prompt, created_at FROM meal_questions ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_meal_question(
    pool: &PgPool,
    id: i32,
) -> Result<Option<MealQuestion>, sqlx::Error> {
    sqlx::query_as::<_, MealQuestion>(
        "SELECT id, prompt, created_at FROM meal_questions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_sleep_questions(pool: &PgPool) -> Result<Vec<SleepQuestion>, sqlx::Error> {
    sqlx::query_as::<_, SleepQuestion>(
        "SELECT id, prompt, created_at FROM sleep_questions ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_sleep_question(
    pool: &PgPool,
    id: i32,
) -> Result<Option<SleepQuestion>, sqlx::Error> {
    sqlx::query_as::<_, SleepQuestion>(
        "SELECT id, prompt, created_at FROM sleep_questions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_vegetables(pool: &PgPool) -> Result<Vec<Vegetable>, sqlx::Error> {
    sqlx::query_as::<_, Vegetable>("SELECT id, name, color, variety FROM vegetables ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn find_vegetable(pool: &PgPool, id: i32) -> Result<Option<Vegetable>, sqlx::Error> {
    sqlx::query_as::<_, Vegetable>("SELECT id, name, color, variety FROM vegetables WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

// ========== General answers ==========
//
// Every query here takes the owner id and filters on it; rows belonging to
// other users are invisible rather than forbidden. Inserts never read an
// owner from the request.

const ANSWER_COLUMNS: &str = "id, user_id, question_id, vegetable_id, is_allergy, is_unnecessary, \
     answer_type, answer_choice, answer_int, answer_bool, created_at, answered_on";

#[derive(Debug)]
pub struct NewAnswer {
    pub question_id: i32,
    pub vegetable_id: Option<i32>,
    pub is_allergy: bool,
    pub is_unnecessary: bool,
    pub value: AnswerValue,
}

pub async fn insert_answer(
    pool: &PgPool,
    owner: Uuid,
    answer: NewAnswer,
) -> Result<AnswerRow, sqlx::Error> {
    let shape = answer.value.shape();
    let (choice, int, boolean) = answer.value.into_parts();
    sqlx::query_as::<_, AnswerRow>(&format!(
        r#"
        INSERT INTO answers
            (user_id, question_id, vegetable_id, is_allergy, is_unnecessary,
             answer_type, answer_choice, answer_int, answer_bool)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {ANSWER_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(answer.question_id)
    .bind(answer.vegetable_id)
    .bind(answer.is_allergy)
    .bind(answer.is_unnecessary)
    .bind(shape)
    .bind(choice)
    .bind(int)
    .bind(boolean)
    .fetch_one(pool)
    .await
}

pub async fn list_answers(pool: &PgPool, owner: Uuid) -> Result<Vec<AnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerRow>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM answers WHERE user_id = $1 ORDER BY id DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn find_answer(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
) -> Result<Option<AnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerRow>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM answers WHERE id = $2 AND user_id = $1"
    ))
    .bind(owner)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_answer(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
    vegetable_id: Option<i32>,
    is_allergy: bool,
    is_unnecessary: bool,
    value: AnswerValue,
) -> Result<Option<AnswerRow>, sqlx::Error> {
    let shape = value.shape();
    let (choice, int, boolean) = value.into_parts();
    sqlx::query_as::<_, AnswerRow>(&format!(
        r#"
        UPDATE answers
        SET vegetable_id = $3,
            is_allergy = $4,
            is_unnecessary = $5,
            answer_type = $6,
            answer_choice = $7,
            answer_int = $8,
            answer_bool = $9
        WHERE id = $2 AND user_id = $1
        RETURNING {ANSWER_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(id)
    .bind(vegetable_id)
    .bind(is_allergy)
    .bind(is_unnecessary)
    .bind(shape)
    .bind(choice)
    .bind(int)
    .bind(boolean)
    .fetch_optional(pool)
    .await
}

pub async fn list_answers_yesterday(
    pool: &PgPool,
    owner: Uuid,
) -> Result<Vec<AnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerRow>(&format!(
        r#"
        SELECT {ANSWER_COLUMNS}
        FROM answers
        WHERE user_id = $1
          AND answered_on = (now() AT TIME ZONE 'utc')::date - 1
        ORDER BY id DESC
        "#
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn list_answers_week(
    pool: &PgPool,
    owner: Uuid,
    category: QuestionCategory,
) -> Result<Vec<AnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerRow>(
        r#"
        SELECT a.id, a.user_id, a.question_id, a.vegetable_id, a.is_allergy, a.is_unnecessary,
               a.answer_type, a.answer_choice, a.answer_int, a.answer_bool,
               a.created_at, a.answered_on
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE a.user_id = $1
          AND a.answered_on BETWEEN (now() AT TIME ZONE 'utc')::date - 7
                                AND (now() AT TIME ZONE 'utc')::date
          AND q.category = $2
        ORDER BY a.id DESC
        "#,
    )
    .bind(owner)
    .bind(category)
    .fetch_all(pool)
    .await
}

// ========== Meal answers ==========

const MEAL_ANSWER_COLUMNS: &str = "id, user_id, meal_question_id, vegetable_id, is_allergy, \
     answer_type, answer_choice, answer_int, answer_bool, created_at, answered_on";

#[derive(Debug)]
pub struct NewMealAnswer {
    pub meal_question_id: i32,
    pub vegetable_id: Option<i32>,
    pub is_allergy: bool,
    pub value: AnswerValue,
}

pub async fn insert_meal_answer(
    pool: &PgPool,
    owner: Uuid,
    answer: NewMealAnswer,
) -> Result<MealAnswerRow, sqlx::Error> {
    let shape = answer.value.shape();
    let (choice, int, boolean) = answer.value.into_parts();
    sqlx::query_as::<_, MealAnswerRow>(&format!(
        r#"
        INSERT INTO meal_answers
            (user_id, meal_question_id, vegetable_id, is_allergy,
             answer_type, answer_choice, answer_int, answer_bool)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {MEAL_ANSWER_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(answer.meal_question_id)
    .bind(answer.vegetable_id)
    .bind(answer.is_allergy)
    .bind(shape)
    .bind(choice)
    .bind(int)
    .bind(boolean)
    .fetch_one(pool)
    .await
}

pub async fn list_meal_answers(
    pool: &PgPool,
    owner: Uuid,
) -> Result<Vec<MealAnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, MealAnswerRow>(&format!(
        "SELECT {MEAL_ANSWER_COLUMNS} FROM meal_answers WHERE user_id = $1 ORDER BY id DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn find_meal_answer(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
) -> Result<Option<MealAnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, MealAnswerRow>(&format!(
        "SELECT {MEAL_ANSWER_COLUMNS} FROM meal_answers WHERE id = $2 AND user_id = $1"
    ))
    .bind(owner)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_meal_answer(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
    vegetable_id: Option<i32>,
    is_allergy: bool,
    value: AnswerValue,
) -> Result<Option<MealAnswerRow>, sqlx::Error> {
    let shape = value.shape();
    let (choice, int, boolean) = value.into_parts();
    sqlx::query_as::<_, MealAnswerRow>(&format!(
        r#"
        UPDATE meal_answers
        SET vegetable_id = $3,
            is_allergy = $4,
            answer_type = $5,
            answer_choice = $6,
            answer_int = $7,
            answer_bool = $8
        WHERE id = $2 AND user_id = $1
        RETURNING {MEAL_ANSWER_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(id)
    .bind(vegetable_id)
    .bind(is_allergy)
    .bind(shape)
    .bind(choice)
    .bind(int)
    .bind(boolean)
    .fetch_optional(pool)
    .await
}

pub async fn delete_meal_answer(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM meal_answers WHERE id = $2 AND user_id = $1")
        .bind(owner)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ========== Sleep answers ==========

const SLEEP_ANSWER_COLUMNS: &str = "id, user_id, sleep_question_id, \
     answer_type, answer_choice, answer_int, answer_bool, created_at, answered_on";

#[derive(Debug)]
pub struct NewSleepAnswer {
    pub sleep_question_id: i32,
    pub value: AnswerValue,
}

pub async fn insert_sleep_answer(
    pool: &PgPool,
    owner: Uuid,
    answer: NewSleepAnswer,
) -> Result<SleepAnswerRow, sqlx::Error> {
    let shape = answer.value.shape();
    let (choice, int, boolean) = answer.value.into_parts();
    sqlx::query_as::<_, SleepAnswerRow>(&format!(
        r#"
        INSERT INTO sleep_answers
            (user_id, sleep_question_id, answer_type, answer_choice, answer_int, answer_bool)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {SLEEP_ANSWER_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(answer.sleep_question_id)
    .bind(shape)
    .bind(choice)
    .bind(int)
    .bind(boolean)
    .fetch_one(pool)
    .await
}

pub async fn list_sleep_answers(
    pool: &PgPool,
    owner: Uuid,
) -> Result<Vec<SleepAnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, SleepAnswerRow>(&format!(
        "SELECT {SLEEP_ANSWER_COLUMNS} FROM sleep_answers WHERE user_id = $1 ORDER BY id DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn find_sleep_answer(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
) -> Result<Option<SleepAnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, SleepAnswerRow>(&format!(
        "SELECT {SLEEP_ANSWER_COLUMNS} FROM sleep_answers WHERE id = $2 AND user_id = $1"
    ))
    .bind(owner)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_sleep_answer(
    pool: &PgPool,
    owner: Uuid,
    id: i64,
    value: AnswerValue,
) -> Result<Option<SleepAnswerRow>, sqlx::Error> {
    let shape = value.shape();
    let (choice, int, boolean) = value.into_parts();
    sqlx::query_as::<_, SleepAnswerRow>(&format!(
        r#"
        UPDATE sleep_answers
        SET answer_type = $3,
            answer_choice = $4,
            answer_int = $5,
            answer_bool = $6
        WHERE id = $2 AND user_id = $1
        RETURNING {SLEEP_ANSWER_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(id)
    .bind(shape)
    .bind(choice)
    .bind(int)
    .bind(boolean)
    .fetch_optional(pool)
    .await
}
