//! Track API client methods

use super::{ApiClient, ApiRequest, ClientError};
use crate::types::{NewTrack, PageRequest, Paginated, Track, TrackUpdate};

impl ApiClient {
    /// List tracks, newest first
    pub async fn list_tracks(&self, page: PageRequest) -> Result<Paginated<Track>, ClientError> {
        let request = ApiRequest::get("/tracks").query_pairs(page.query());
        self.execute(request).await
    }

    /// Full-text search over title, artist and album
    pub async fn search_tracks(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<Paginated<Track>, ClientError> {
        let request = ApiRequest::get("/tracks/search")
            .query("q", query)
            .query_pairs(page.query());
        self.execute(request).await
    }

    pub async fn get_track(&self, id: &str) -> Result<Track, ClientError> {
        self.execute(ApiRequest::get("/tracks").segment(id)).await
    }

    /// Upload an audio file as a new track (artist or admin)
    pub async fn upload_track(&self, track: NewTrack) -> Result<Track, ClientError> {
        let request = ApiRequest::post("/tracks").multipart(track.into_fields());
        self.execute(request).await
    }

    pub async fn update_track(&self, id: &str, update: &TrackUpdate) -> Result<Track, ClientError> {
        let request = ApiRequest::patch("/tracks").segment(id).json(update)?;
        self.execute(request).await
    }

    pub async fn delete_track(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete("/tracks").segment(id))
            .await
    }

    /// URL the audio of a track is streamed from
    pub fn track_stream_url(&self, id: &str) -> Result<String, ClientError> {
        self.url_for(&ApiRequest::get("/tracks/stream").segment(id))
    }
}
