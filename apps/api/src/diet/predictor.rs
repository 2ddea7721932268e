use tracing::debug;
use uuid::Uuid;

use crate::diet::artifacts::{ArtifactStore, TrainedArtifact};
use crate::diet::encoder::encode_for_prediction;
use crate::diet::DietError;
use crate::models::profile::ProfileAttributes;
use crate::store::{ProfileStore, UserStore};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub predicted_diet: String,
    pub model_version: u64,
}

/// Encodes `record` against the artifact's own schema and runs its classifier.
pub fn predict_with(artifact: &TrainedArtifact, record: &ProfileAttributes) -> Result<Prediction, DietError> {
    let row = encode_for_prediction(record, &artifact.schema);
    let predicted_diet = artifact.classifier.predict_row(&row)?;
    Ok(Prediction {
        predicted_diet,
        model_version: artifact.version,
    })
}

/// Predicts for the user's most recently submitted profile.
pub async fn predict_for_user(
    artifacts: &ArtifactStore,
    users: &dyn UserStore,
    profiles: &dyn ProfileStore,
    user_id: Uuid,
) -> Result<Prediction, DietError> {
    let artifact = artifacts.current().await.ok_or(DietError::ModelNotTrained)?;

    users
        .find_by_id(user_id)
        .await
        .map_err(DietError::Store)?
        .ok_or(DietError::UserNotFound(user_id))?;

    let latest = profiles
        .latest_for_user(user_id)
        .await
        .map_err(DietError::Store)?
        .ok_or(DietError::NoProfileData(user_id))?;

    debug!("Predicting for user {user_id} from profile {}", latest.id);
    predict_with(&artifact, &latest.attributes())
}

/// Predicts for a profile supplied directly by the caller; nothing is stored.
pub async fn predict_for_input(
    artifacts: &ArtifactStore,
    record: &ProfileAttributes,
) -> Result<Prediction, DietError> {
    let artifact = artifacts.current().await.ok_or(DietError::ModelNotTrained)?;
    let record = record.normalized().map_err(DietError::InvalidProfile)?;
    predict_with(&artifact, &record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::forest::ForestParams;
    use crate::diet::trainer::{retrain, TrainingConfig};
    use crate::store::{CreateUser, NewUser};
    use crate::testing::{profile, sample_profiles, MemoryProfileStore, MemoryUserStore};

    struct Fixture {
        _dir: tempfile::TempDir,
        artifacts: ArtifactStore,
        users: MemoryUserStore,
        profiles: MemoryProfileStore,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactStore::open(dir.path()).await.unwrap();
        Fixture {
            _dir: dir,
            artifacts,
            users: MemoryUserStore::default(),
            profiles: MemoryProfileStore::default(),
        }
    }

    async fn add_user(f: &Fixture, username: &str) -> Uuid {
        match f
            .users
            .create(NewUser {
                username: username.to_string(),
                password_hash: "x".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap()
        {
            CreateUser::Created(user) => user.id,
            CreateUser::UsernameTaken => panic!("{username} already exists"),
        }
    }

    async fn trained(f: &Fixture) {
        let trainer = add_user(f, "trainer").await;
        for p in sample_profiles() {
            f.profiles.insert(trainer, &p).await.unwrap();
        }
        let config = TrainingConfig {
            forest: ForestParams {
                n_estimators: 20,
                ..ForestParams::default()
            },
            ..TrainingConfig::default()
        };
        retrain(&f.profiles, &f.artifacts, config).await.unwrap();
    }

    #[tokio::test]
    async fn test_untrained_model() {
        let f = fixture().await;
        let user = add_user(&f, "johndoe").await;
        let err = predict_for_user(&f.artifacts, &f.users, &f.profiles, user)
            .await
            .unwrap_err();
        assert!(matches!(err, DietError::ModelNotTrained));

        let err = predict_for_input(&f.artifacts, &sample_profiles()[0])
            .await
            .unwrap_err();
        assert!(matches!(err, DietError::ModelNotTrained));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let f = fixture().await;
        trained(&f).await;
        let missing = Uuid::new_v4();
        let err = predict_for_user(&f.artifacts, &f.users, &f.profiles, missing)
            .await
            .unwrap_err();
        assert!(matches!(err, DietError::UserNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_user_without_profile() {
        let f = fixture().await;
        trained(&f).await;
        let user = add_user(&f, "johndoe").await;
        let err = predict_for_user(&f.artifacts, &f.users, &f.profiles, user)
            .await
            .unwrap_err();
        assert!(matches!(err, DietError::NoProfileData(_)));
    }

    #[tokio::test]
    async fn test_prediction_is_a_trained_label() {
        let f = fixture().await;
        trained(&f).await;
        let user = add_user(&f, "johndoe").await;
        f.profiles
            .insert(user, &profile(30, "Male", "Moderate", "Muscle Gain", "Balanced"))
            .await
            .unwrap();

        let prediction = predict_for_user(&f.artifacts, &f.users, &f.profiles, user)
            .await
            .unwrap();
        let artifact = f.artifacts.current().await.unwrap();
        assert!(artifact
            .classifier
            .labels()
            .contains(&prediction.predicted_diet));
        assert_eq!(prediction.model_version, 1);
    }

    #[tokio::test]
    async fn test_latest_profile_wins() {
        let f = fixture().await;
        trained(&f).await;
        let user = add_user(&f, "janedoe").await;
        let older = profile(62, "Female", "Low", "Weight Loss", "Vegan");
        let newer = profile(24, "Male", "High", "Muscle Gain", "High Protein");
        f.profiles.insert(user, &older).await.unwrap();
        f.profiles.insert(user, &newer).await.unwrap();

        let artifact = f.artifacts.current().await.unwrap();
        let expected = predict_with(&artifact, &newer).unwrap();
        let actual = predict_for_user(&f.artifacts, &f.users, &f.profiles, user)
            .await
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_input_with_unseen_categories() {
        let f = fixture().await;
        trained(&f).await;
        let odd = profile(45, "Nonbinary", "Sedentary", "Endurance", "Paleo");
        let prediction = predict_for_input(&f.artifacts, &odd).await.unwrap();
        let artifact = f.artifacts.current().await.unwrap();
        assert!(artifact.classifier.labels().contains(&prediction.predicted_diet));
    }

    #[tokio::test]
    async fn test_input_is_validated() {
        let f = fixture().await;
        trained(&f).await;
        let mut bad = sample_profiles()[0].clone();
        bad.gender = " ".to_string();
        let err = predict_for_input(&f.artifacts, &bad).await.unwrap_err();
        assert!(matches!(err, DietError::InvalidProfile(ref e) if e.field == "gender"));
    }
}
