#![allow(dead_code)]

use std::time::Duration;

use lectern::database::{Database, Record};
use lectern::model::{Course, Lesson, Principal, Role, User};
use lectern::service::{RetryPolicy, Service};

pub struct Fixture {
    pub service: Service,
    pub instructor: Principal,
    pub alice: Principal,
    pub bob: Principal,
    pub admin: Principal,
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

impl Fixture {
    pub fn database(&self) -> &Database {
        self.service.database()
    }

    pub fn lesson(&self, position: usize) -> Record<Lesson> {
        self.lessons[position].id.clone()
    }
}

pub async fn service() -> Service {
    let database = Database::memory().await.expect("in-memory database");
    Service::with_retry(database, RetryPolicy::new(5, Duration::from_millis(1)))
}

pub async fn user(database: &Database, key: &str, role: Role) -> Principal {
    let mut user = User::new(key.to_string(), "Tester".into(), format!("{key}@example.com"));
    user.id = Record::new(key);
    user.role = role;

    let user = database.insert(&user).await.expect("insert user");
    Principal::from(&user)
}

/// A course with `lesson_count` lessons. The first lesson is a preview.
pub async fn course(
    database: &Database,
    key: &str,
    instructor: &Principal,
    lesson_count: u32,
    published: bool,
) -> (Course, Vec<Lesson>) {
    let mut course = Course::new(format!("Course {key}"), instructor.id.clone());
    course.id = Record::new(key);
    course.is_published = published;

    let mut lessons = Vec::new();
    for order in 1..=lesson_count {
        let mut lesson = Lesson::new(course.id.clone(), format!("Lesson {order}"), order);
        lesson.id = Record::new(format!("{key}-{order}"));
        lesson.is_preview = order == 1;

        lessons.push(database.insert(&lesson).await.expect("insert lesson"));
    }

    course.lessons = lessons.iter().map(|lesson| lesson.id.clone()).collect();
    let course = database.insert(&course).await.expect("insert course");

    (course, lessons)
}

/// A published four lesson course, its instructor, two students and an admin.
pub async fn fixture() -> Fixture {
    fixture_with_lessons(4).await
}

pub async fn fixture_with_lessons(lesson_count: u32) -> Fixture {
    let service = service().await;
    let database = service.database().clone();

    let instructor = user(&database, "ferris", Role::Instructor).await;
    let alice = user(&database, "alice", Role::Student).await;
    let bob = user(&database, "bob", Role::Student).await;
    let admin = user(&database, "root", Role::Admin).await;
    let (course, lessons) = course(&database, "rust", &instructor, lesson_count, true).await;

    Fixture {
        service,
        instructor,
        alice,
        bob,
        admin,
        course,
        lessons,
    }
}
