//! Clubs: named member lists that can be pulled into a thread.

use std::collections::HashSet;
use std::sync::Arc;

use crate::model::ClubMemberModel;
use crate::model::ClubModel;
use crate::model::ClubSummary;
use crate::repository::Repository;
use crate::repository::table::Table;
use crate::service::Caller;
use crate::service::error::ServiceError;

pub struct ClubService {
    pub db: Arc<Repository>,
}

impl ClubService {
    pub fn new(db: Arc<Repository>) -> Self {
        Self { db }
    }

    async fn get(&self, guild_id: u64, name: &str) -> Result<ClubModel, ServiceError> {
        self.db
            .club
            .select_by_name(guild_id, name)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Club {name} does not exist")))
    }

    /// Returns the stored, lowercased name.
    pub async fn create(&self, caller: &Caller, name: &str) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        if self
            .db
            .club
            .select_by_name(caller.guild_id, &name)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(format!(
                "Club {name} already exists"
            )));
        }

        self.db
            .club
            .insert(&ClubModel {
                name: name.clone(),
                guild_id: caller.guild_id,
                creator_id: caller.user_id,
                ..Default::default()
            })
            .await?;
        Ok(name)
    }

    /// Creator or guild managers only. Memberships go with the club.
    pub async fn delete(&self, caller: &Caller, name: &str) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        let club = self.get(caller.guild_id, &name).await?;
        if !caller.owns_or_manages(club.creator_id) {
            return Err(ServiceError::not_owner(format!(
                "You are not the creator of the club {name}"
            )));
        }
        self.db.club.delete(&club.id).await?;
        Ok(name)
    }

    pub async fn join(&self, caller: &Caller, name: &str) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        let club = self.get(caller.guild_id, &name).await?;
        if self
            .db
            .club_member
            .select_by_club_and_user(club.id, caller.user_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(format!(
                "You are already in club {name}"
            )));
        }

        self.db
            .club_member
            .insert(&ClubMemberModel {
                club_id: club.id,
                user_id: caller.user_id,
                ..Default::default()
            })
            .await?;
        Ok(name)
    }

    pub async fn leave(&self, caller: &Caller, name: &str) -> Result<String, ServiceError> {
        let name = name.to_lowercase();
        let club = self.get(caller.guild_id, &name).await?;
        if !self
            .db
            .club_member
            .delete_by_club_and_user(club.id, caller.user_id)
            .await?
        {
            return Err(ServiceError::not_found(format!("You are not in club {name}")));
        }
        Ok(name)
    }

    pub async fn list(&self, guild_id: u64) -> Result<Vec<ClubSummary>, ServiceError> {
        Ok(self.db.club.select_summaries_by_guild(guild_id).await?)
    }

    /// Club members not yet in the thread, who should be added to it.
    pub async fn publish_targets(
        &self,
        caller: &Caller,
        name: &str,
        thread_members: &[u64],
    ) -> Result<Vec<u64>, ServiceError> {
        let name = name.to_lowercase();
        let club = self.get(caller.guild_id, &name).await?;
        if !caller.owns_or_manages(club.creator_id) {
            return Err(ServiceError::not_owner(format!(
                "You are not the creator of club {name}"
            )));
        }

        let present: HashSet<u64> = thread_members.iter().copied().collect();
        Ok(self
            .db
            .club_member
            .select_user_ids_by_club(club.id)
            .await?
            .into_iter()
            .filter(|user_id| !present.contains(user_id))
            .collect())
    }
}

/// Lines of the club listing, or the empty-guild message.
pub fn format_club_list(clubs: &[ClubSummary]) -> String {
    if clubs.is_empty() {
        return "No clubs exist".to_string();
    }
    clubs
        .iter()
        .map(|club| format!("{} ({} members)", club.name, club.members))
        .collect::<Vec<_>>()
        .join("\n")
}
