//! Course catalog database operations
//!
//! The catalog is a three-level hierarchy: a course owns its semesters,
//! a semester owns its subjects. Subjects are append-only; uploads merge
//! into existing courses and semesters by key.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

/// A course with its full nested hierarchy, in upload order.
#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: String,
    #[serde(rename = "courseName")]
    pub course_name: String,
    pub semesters: Vec<Semester>,
}

/// A semester entry within a course.
#[derive(Debug, Clone, Serialize)]
pub struct Semester {
    pub semester: i64,
    pub subjects: Vec<Subject>,
}

/// A subject: a display name paired with the stored file's retrieval URL.
#[derive(Debug, Clone, Serialize)]
pub struct Subject {
    pub name: String,
    pub url: String,
}

/// Catalog repository
pub struct CatalogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Return every course with its nested semesters and subjects.
    pub async fn list_all(&self) -> Result<Vec<Course>> {
        let courses: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM courses ORDER BY rowid")
                .fetch_all(self.pool)
                .await?;

        let semesters: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT id, course_id, number FROM semesters ORDER BY rowid")
                .fetch_all(self.pool)
                .await?;

        let subjects: Vec<(String, String, String)> =
            sqlx::query_as("SELECT semester_id, name, url FROM subjects ORDER BY rowid")
                .fetch_all(self.pool)
                .await?;

        // Group leaves under their parents, preserving insertion order.
        let mut subjects_by_semester: HashMap<String, Vec<Subject>> = HashMap::new();
        for (semester_id, name, url) in subjects {
            subjects_by_semester
                .entry(semester_id)
                .or_default()
                .push(Subject { name, url });
        }

        let mut semesters_by_course: HashMap<String, Vec<Semester>> = HashMap::new();
        for (id, course_id, number) in semesters {
            semesters_by_course
                .entry(course_id)
                .or_default()
                .push(Semester {
                    semester: number,
                    subjects: subjects_by_semester.remove(&id).unwrap_or_default(),
                });
        }

        let catalog = courses
            .into_iter()
            .map(|(id, name)| Course {
                semesters: semesters_by_course.remove(&id).unwrap_or_default(),
                id,
                course_name: name,
            })
            .collect();

        Ok(catalog)
    }

    /// Record an uploaded file under course/semester/subject and return the
    /// full updated catalog.
    ///
    /// Runs as a single transaction with conflict-ignoring inserts keyed on
    /// the unique indexes, so concurrent uploads to the same course cannot
    /// duplicate a course or lose a sibling subject.
    pub async fn record_upload(
        &self,
        course_name: &str,
        semester_number: i64,
        subject_name: &str,
        file_url: &str,
    ) -> Result<Vec<Course>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO courses (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(Uuid::new_v4().to_string())
            .bind(course_name)
            .execute(&mut *tx)
            .await?;

        let (course_id,): (String,) = sqlx::query_as("SELECT id FROM courses WHERE name = ?")
            .bind(course_name)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO semesters (id, course_id, number)
            VALUES (?, ?, ?)
            ON CONFLICT(course_id, number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&course_id)
        .bind(semester_number)
        .execute(&mut *tx)
        .await?;

        let (semester_id,): (String,) =
            sqlx::query_as("SELECT id FROM semesters WHERE course_id = ? AND number = ?")
                .bind(&course_id)
                .bind(semester_number)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO subjects (id, semester_id, name, url, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&semester_id)
        .bind(subject_name)
        .bind(file_url)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.list_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    #[tokio::test]
    async fn empty_catalog_lists_nothing() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = CatalogRepository::new(&pool);

        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_course_creates_one_of_each() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = CatalogRepository::new(&pool);

        let catalog = repo
            .record_upload("Math101", 3, "Calculus", "https://files/calc.pdf")
            .await
            .unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].course_name, "Math101");
        assert_eq!(catalog[0].semesters.len(), 1);
        assert_eq!(catalog[0].semesters[0].semester, 3);
        assert_eq!(catalog[0].semesters[0].subjects.len(), 1);
        assert_eq!(catalog[0].semesters[0].subjects[0].name, "Calculus");
        assert_eq!(
            catalog[0].semesters[0].subjects[0].url,
            "https://files/calc.pdf"
        );
    }

    #[tokio::test]
    async fn repeated_upload_merges_into_one_course_and_semester() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = CatalogRepository::new(&pool);

        repo.record_upload("Math101", 3, "Calculus", "https://files/calc.pdf")
            .await
            .unwrap();
        let catalog = repo
            .record_upload("Math101", 3, "Algebra", "https://files/alg.pdf")
            .await
            .unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].semesters.len(), 1);

        let subjects = &catalog[0].semesters[0].subjects;
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].url, "https://files/calc.pdf");
        assert_eq!(subjects[1].url, "https://files/alg.pdf");
    }

    #[tokio::test]
    async fn different_semester_stays_under_the_same_course() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = CatalogRepository::new(&pool);

        repo.record_upload("Math101", 3, "Calculus", "https://files/calc.pdf")
            .await
            .unwrap();
        let catalog = repo
            .record_upload("Math101", 4, "Statistics", "https://files/stats.pdf")
            .await
            .unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].semesters.len(), 2);
        assert_eq!(catalog[0].semesters[0].semester, 3);
        assert_eq!(catalog[0].semesters[1].semester, 4);
    }

    #[tokio::test]
    async fn distinct_courses_list_in_upload_order() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = CatalogRepository::new(&pool);

        repo.record_upload("Math101", 1, "Calculus", "u1").await.unwrap();
        let catalog = repo.record_upload("CS202", 2, "Compilers", "u2").await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].course_name, "Math101");
        assert_eq!(catalog[1].course_name, "CS202");
    }

    #[tokio::test]
    async fn catalog_serializes_with_original_field_names() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = CatalogRepository::new(&pool);

        let catalog = repo.record_upload("Math101", 3, "Calculus", "u").await.unwrap();
        let json = serde_json::to_value(&catalog).unwrap();

        assert_eq!(json[0]["courseName"], "Math101");
        assert_eq!(json[0]["semesters"][0]["semester"], 3);
        assert_eq!(json[0]["semesters"][0]["subjects"][0]["name"], "Calculus");
    }
}
