use tube_core::TubeApp;

/// Router state shared by every REST handler of a service.
pub struct TubeAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: TubeApp<R, P>,
}

impl<R, P> Clone for TubeAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
        }
    }
}

impl<R, P> TubeAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: TubeApp<R, P>) -> Self {
        Self { app }
    }
}
