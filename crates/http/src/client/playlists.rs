//! Playlist API client methods

use super::{ApiClient, ApiRequest, ClientError};
use crate::types::{NewPlaylist, PageRequest, Paginated, Playlist, PlaylistUpdate, Track};
use futures::future::try_join_all;

impl ApiClient {
    /// List playlists; `mine` restricts the list to the signed-in user's own
    pub async fn list_playlists(
        &self,
        page: PageRequest,
        mine: bool,
    ) -> Result<Paginated<Playlist>, ClientError> {
        let mut request = ApiRequest::get("/playlists").query_pairs(page.query());
        if mine {
            request = request.query("myPlaylists", "true");
        }
        self.execute(request).await
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Playlist, ClientError> {
        self.execute(ApiRequest::get("/playlists").segment(id))
            .await
    }

    /// Fetch every track of a playlist concurrently, keeping playlist order
    pub async fn playlist_tracks(&self, playlist: &Playlist) -> Result<Vec<Track>, ClientError> {
        try_join_all(playlist.track_ids.iter().map(|id| self.get_track(id))).await
    }

    pub async fn create_playlist(&self, playlist: NewPlaylist) -> Result<Playlist, ClientError> {
        let request = ApiRequest::post("/playlists").multipart(playlist.into_fields());
        self.execute(request).await
    }

    /// Partially update a playlist (owner or admin)
    pub async fn update_playlist(
        &self,
        id: &str,
        update: PlaylistUpdate,
    ) -> Result<Playlist, ClientError> {
        let request = ApiRequest::patch("/playlists").segment(id).multipart(update.into_fields());
        self.execute(request).await
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete("/playlists").segment(id))
            .await
    }

    /// URL of the playlist as an M3U file
    pub fn playlist_stream_url(&self, id: &str) -> Result<String, ClientError> {
        self.url_for(&ApiRequest::get("/playlists/stream").segment(id))
    }
}
