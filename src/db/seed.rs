use super::QuestionCategory;
use crate::domain::answer::AnswerShape;
use sqlx::PgPool;

struct SeedQuestion {
    prompt: &'static str,
    category: QuestionCategory,
    answer_type: AnswerShape,
    is_necessary: bool,
    choices: &'static [&'static str],
}

const AMOUNT_CHOICES: &[&str] = &["none", "a bit", "normal", "a lot"];

pub async fn seed_all(pool: &PgPool) -> Result<(), sqlx::Error> {
    seed_questions(pool).await?;
    seed_meal_questions(pool).await?;
    seed_sleep_questions(pool).await?;
    seed_vegetables(pool).await?;
    Ok(())
}

async fn table_is_empty(pool: &PgPool, table: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(count == 0)
}

async fn seed_questions(pool: &PgPool) -> Result<(), sqlx::Error> {
    if !table_is_empty(pool, "questions").await? {
        return Ok(());
    }

    let questions = [
        SeedQuestion {
            prompt: "How much processed food did you eat yesterday?",
            category: QuestionCategory::Meal,
            answer_type: AnswerShape::Choice,
            is_necessary: true,
            choices: AMOUNT_CHOICES,
        },
        SeedQuestion {
            prompt: "How much fried food did you eat yesterday?",
            category: QuestionCategory::Meal,
            answer_type: AnswerShape::Choice,
            is_necessary: true,
            choices: AMOUNT_CHOICES,
        },
        SeedQuestion {
            prompt: "Were you able to control your appetite today?",
            category: QuestionCategory::Meal,
            answer_type: AnswerShape::Boolean,
            is_necessary: false,
            choices: &[],
        },
        SeedQuestion {
            prompt: "How many minutes did you spend exercising today?",
            category: QuestionCategory::Exercise,
            answer_type: AnswerShape::Integer,
            is_necessary: true,
            choices: &[],
        },
        SeedQuestion {
            prompt: "Did you break a sweat while moving today?",
            category: QuestionCategory::Exercise,
            answer_type: AnswerShape::Boolean,
            is_necessary: false,
            choices: &[],
        },
        SeedQuestion {
            prompt: "How many hours did you sleep last night?",
            category: QuestionCategory::Sleep,
            answer_type: AnswerShape::Integer,
            is_necessary: true,
            choices: &[],
        },
        SeedQuestion {
            prompt: "Did you wake up feeling rested?",
            category: QuestionCategory::Sleep,
            answer_type: AnswerShape::Boolean,
            is_necessary: true,
            choices: &[],
        },
    ];

    for question in questions {
        sqlx::query(
            r#"
            INSERT INTO questions (prompt, category, answer_type, is_necessary, choices)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(question.prompt)
        .bind(question.category)
        .bind(question.answer_type)
        .bind(question.is_necessary)
        .bind(
            question
                .choices
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>(),
        )
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_meal_questions(pool: &PgPool) -> Result<(), sqlx::Error> {
    if !table_is_empty(pool, "meal_questions").await? {
        return Ok(());
    }

    let prompts = [
        "Did you eat vegetables with every meal today?",
        "Did you eat anything after nine in the evening?",
        "How many cups of water did you drink today?",
        "Did any food cause you an allergic reaction today?",
    ];

    for prompt in prompts {
        sqlx::query("INSERT INTO meal_questions (prompt) VALUES ($1)")
            .bind(prompt)
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_sleep_questions(pool: &PgPool) -> Result<(), sqlx::Error> {
    if !table_is_empty(pool, "sleep_questions").await? {
        return Ok(());
    }

    let prompts = [
        "Did you look at a screen within an hour of going to bed?",
        "How many times did you wake during the night?",
        "Did you take a nap today?",
    ];

    for prompt in prompts {
        sqlx::query("INSERT INTO sleep_questions (prompt) VALUES ($1)")
            .bind(prompt)
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_vegetables(pool: &PgPool) -> Result<(), sqlx::Error> {
    if !table_is_empty(pool, "vegetables").await? {
        return Ok(());
    }

    let vegetables = [
        ("carrot", "orange", "root"),
        ("spinach", "green", "leafy"),
        ("tomato", "red", "fruit"),
        ("broccoli", "green", "flower"),
        ("onion", "white", "bulb"),
        ("pumpkin", "orange", "fruit"),
        ("cucumber", "green", "fruit"),
        ("eggplant", "purple", "fruit"),
    ];

    for (name, color, variety) in vegetables {
        sqlx::query("INSERT INTO vegetables (name, color, variety) VALUES ($1, $2, $3)")
            .bind(name)
            .bind(color)
            .bind(variety)
            .execute(pool)
            .await?;
    }
    Ok(())
}
