mod common;

use common::{manual_clock, portal, test_config, CountingStore, FlakyStore};
use exam_question_import::infrastructure::{JsonFileStore, MemoryStore};
use exam_question_import::models::{Difficulty, ExamSubmission, NewExam, Question};
use exam_question_import::{App, Config};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn question(id: &str, topic: &str, difficulty: Difficulty) -> Question {
    let mut q = Question {
        id: id.to_string(),
        correct_answer: "a".to_string(),
        ..Default::default()
    };
    q.metadata.topic = topic.to_string();
    q.metadata.difficulty = difficulty;
    q
}

#[tokio::test]
async fn test_exam_list_is_served_from_cache_within_ttl() {
    let store = Arc::new(CountingStore::default());
    let clock = manual_clock();
    let api = portal(store.clone(), clock.clone());

    api.get_exams().await.unwrap();
    api.get_exams().await.unwrap();
    assert_eq!(store.exam_queries(), 1);

    clock.advance(chrono::Duration::minutes(500));
    api.get_exams().await.unwrap();
    assert_eq!(store.exam_queries(), 2);
}

#[tokio::test]
async fn test_add_and_delete_exam_are_never_served_stale() {
    let store = Arc::new(CountingStore::default());
    let api = portal(store.clone(), manual_clock());
    api.get_exams().await.unwrap();

    let id = api
        .add_exam(NewExam {
            name: "Mock 1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id;
    let exams = api.get_exams().await.unwrap();
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].name, "Mock 1");

    api.delete_exam(&id).await.unwrap();
    assert!(api.get_exams().await.unwrap().is_empty());
    assert_eq!(store.exam_queries(), 3);
}

#[tokio::test]
async fn test_delete_semantics() {
    let api = portal(Arc::new(MemoryStore::new()), manual_clock());
    let exam_id = api.add_exam(NewExam::default()).await.unwrap().id;
    api.save_question(&exam_id, question("q1", "Optics", Difficulty::Easy))
        .await
        .unwrap();

    assert_ok!(api.delete_question(&exam_id, "q1").await);
    // 再删一次仍然成功
    assert_ok!(api.delete_question(&exam_id, "q1").await);
    assert!(api.get_exam_questions(&exam_id).await.unwrap().questions.is_empty());

    // 试卷不存在时删除题目是 NotFound
    assert!(api
        .delete_question("ghost", "q1")
        .await
        .unwrap_err()
        .is_not_found());

    // 删除不存在的试卷视为成功
    assert_ok!(api.delete_exam("ghost").await);

    // 知识点计数不回退
    assert_eq!(api.get_topics().await.unwrap()[0].question_count, 1);
}

#[tokio::test]
async fn test_deleting_exam_keeps_questions() {
    let api = portal(Arc::new(MemoryStore::new()), manual_clock());
    let exam_id = api.add_exam(NewExam::default()).await.unwrap().id;
    api.save_question(&exam_id, question("q1", "Optics", Difficulty::Easy))
        .await
        .unwrap();

    api.delete_exam(&exam_id).await.unwrap();

    assert!(api.get_question_by_id("q1").await.unwrap().is_some());
    let err = assert_err!(api.get_exam(&exam_id).await);
    assert!(err.is_not_found());
    assert!(api
        .get_exam_questions(&exam_id)
        .await
        .unwrap()
        .questions
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_topic_count_survives_retried_topic_write() {
    // 第二道题的知识点递增第一次写入失败，重试成功
    let store = Arc::new(FlakyStore::failing_topic_puts(1));
    let api = portal(store.clone(), manual_clock());
    let exam_id = api.add_exam(NewExam::default()).await.unwrap().id;

    assert_ok!(
        api.save_question(&exam_id, question("q1", "Algebra", Difficulty::Easy))
            .await
    );
    assert_ok!(
        api.save_question(&exam_id, question("q2", "Algebra", Difficulty::Easy))
            .await
    );

    let topics = api.get_topics().await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].question_count, 2);
    let exam = api.repository().get_exam(&exam_id).await.unwrap().unwrap();
    assert_eq!(exam.question_ids, vec!["q1", "q2"]);
    assert_eq!(exam.metadata.question_count, 2);
}

#[tokio::test]
async fn test_blank_question_id_is_replaced() {
    let api = portal(Arc::new(MemoryStore::new()), manual_clock());
    let exam_id = api.add_exam(NewExam::default()).await.unwrap().id;

    let saved = api
        .save_question(&exam_id, question("   ", "Optics", Difficulty::Easy))
        .await
        .unwrap();

    assert!(!saved.id.is_empty());
    let ids = api.get_exam_questions(&exam_id).await.unwrap();
    assert_eq!(ids.questions.len(), 1);
    assert_eq!(ids.questions[0].id, saved.id);
    assert!(api.get_question_by_id("").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cached_exam_lags_question_saves_until_ttl() {
    let clock = manual_clock();
    let api = portal(Arc::new(MemoryStore::new()), clock.clone());
    let exam_id = api.add_exam(NewExam::default()).await.unwrap().id;
    api.get_exams().await.unwrap();

    api.save_question(&exam_id, question("q1", "Optics", Difficulty::Easy))
        .await
        .unwrap();
    assert_eq!(api.get_exam(&exam_id).await.unwrap().metadata.question_count, 0);

    clock.advance(chrono::Duration::minutes(500));
    api.get_exams().await.unwrap();
    assert_eq!(api.get_exam(&exam_id).await.unwrap().metadata.question_count, 1);
}

#[tokio::test]
async fn test_topic_and_difficulty_queries() {
    let api = portal(Arc::new(MemoryStore::new()), manual_clock());
    let exam_id = api.add_exam(NewExam::default()).await.unwrap().id;
    for (id, topic, level) in [
        ("q1", "Optics", Difficulty::Easy),
        ("q2", "Optics", Difficulty::Hard),
        ("q3", "Waves", Difficulty::Hard),
    ] {
        api.save_question(&exam_id, question(id, topic, level))
            .await
            .unwrap();
    }

    assert_eq!(api.get_exam_questions_by_topic("Optics").await.unwrap().len(), 2);
    assert_eq!(
        api.get_exam_questions_by_difficulty(Difficulty::Hard)
            .await
            .unwrap()
            .len(),
        2
    );
    let both = api
        .get_exam_questions_by_topic_and_difficulty("Optics", Difficulty::Hard)
        .await
        .unwrap();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].id, "q2");

    assert!(api.add_topic("Optics").await.unwrap().is_none());
    assert!(api.add_topic("Thermo").await.unwrap().is_some());
    assert_eq!(api.get_topics().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_exam_results_round_trip() {
    let api = portal(Arc::new(MemoryStore::new()), manual_clock());
    let first = api.add_exam(NewExam::default()).await.unwrap().id;
    let second = api.add_exam(NewExam::default()).await.unwrap().id;

    let submission = ExamSubmission {
        score: 36,
        answers: serde_json::json!({"q1": "a"}),
    };
    api.save_exam_result("u1", &first, submission).await.unwrap();
    api.save_exam_result("u1", &second, ExamSubmission::default())
        .await
        .unwrap();

    assert_eq!(api.get_user_exam_results("u1").await.unwrap().len(), 2);
    let saved = api.get_user_exam_result("u1", &first).await.unwrap().unwrap();
    assert_eq!(saved.answers["q1"], "a");
    assert_eq!(api.get_exam_results(&first).await.unwrap().len(), 1);

    let batch = api
        .batch_get_user_exam_results("u1", &[first.clone()])
        .await
        .unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[&first].score, 36);

    api.delete_exam_result("u1", &first).await.unwrap();
    assert!(api.get_exam_results(&first).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_json_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let exam_id = {
        let store = JsonFileStore::open(&path).await.unwrap();
        let api = portal(Arc::new(store), manual_clock());
        let exam_id = api.add_exam(NewExam::default()).await.unwrap().id;
        api.save_question(&exam_id, question("q1", "Optics", Difficulty::Easy))
            .await
            .unwrap();
        exam_id
    };

    let reopened = JsonFileStore::open(&path).await.unwrap();
    let api = portal(Arc::new(reopened), manual_clock());
    let result = api.get_exam_questions(&exam_id).await.unwrap();
    assert_eq!(result.questions.len(), 1);
    assert_eq!(result.questions[0].id, "q1");
}

#[tokio::test(start_paused = true)]
async fn test_app_processes_job_folder() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = dir.path().join("imports");
    std::fs::create_dir(&jobs).unwrap();

    let config = Config {
        store_path: dir.path().join("store.json").to_string_lossy().to_string(),
        import_folder: jobs.to_string_lossy().to_string(),
        output_log_file: dir.path().join("run.log").to_string_lossy().to_string(),
        warn_file: dir.path().join("warn.txt").to_string_lossy().to_string(),
        ..test_config()
    };

    let app = App::initialize(config.clone()).await.unwrap();
    let exam_id = app.api().add_exam(NewExam::default()).await.unwrap().id;

    let good = format!(
        "exam_id = \"{exam_id}\"\ntopic = \"Arithmetic\"\nsection = \"s1\"\nwith_answers = true\ntext = \"\"\"\nQ. 1 2+2=?\nA) 3\nB) 4\nC) 5\nD) 6\nAnswer: Z\nSolution: Count.\n\"\"\"\n"
    );
    let rejected = "exam_id = \"ghost\"\ntopic = \"t\"\nsection = \"s\"\ntext = \"Q. 1 x?\\nA) 1\\nB) 2\\nC) 3\\nD) 4\"\n";
    std::fs::write(jobs.join("a_good.toml"), good).unwrap();
    std::fs::write(jobs.join("b_rejected.toml"), rejected).unwrap();

    let stats = app.run().await.unwrap();

    assert_eq!(stats.jobs_total, 2);
    assert_eq!(stats.jobs_succeeded, 1);
    assert_eq!(stats.questions_saved, 1);
    assert_eq!(stats.fallbacks, 1);
    assert!(!jobs.join("a_good.toml").exists());
    assert!(jobs.join("b_rejected.toml").exists());

    let warn = std::fs::read_to_string(&config.warn_file).unwrap();
    assert!(warn.contains("[默认答案]"));
    assert!(warn.contains("2+2=?"));
}
