use crate::domain::model::{DateRange, Hotel, Period, PeriodGroup, PeriodId};

/// 由單次抽取擁有的期間編號產生器，從 1 開始
#[derive(Debug, Clone)]
pub struct PeriodIdAllocator {
    next: u32,
}

impl Default for PeriodIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl PeriodIdAllocator {
    pub fn allocate(&mut self) -> PeriodId {
        let id = PeriodId(self.next);
        self.next += 1;
        id
    }
}

/// 依「名稱列與日期列的距離」把區間歸入期間群組
#[derive(Debug, Clone)]
pub struct PeriodGrouper {
    proximity_window: usize,
    unnamed_group_name: String,
    ids: PeriodIdAllocator,
    label_seen: bool,
    label_row: Option<usize>,
    label_group: Option<usize>,
    unnamed_group: Option<usize>,
}

impl PeriodGrouper {
    pub fn new(proximity_window: usize, unnamed_group_name: impl Into<String>) -> Self {
        Self {
            proximity_window,
            unnamed_group_name: unnamed_group_name.into(),
            ids: PeriodIdAllocator::default(),
            label_seen: false,
            label_row: None,
            label_group: None,
            unnamed_group: None,
        }
    }

    /// 新飯店：名稱列狀態全部歸零 (編號不歸零)
    pub fn reset_for_hotel(&mut self) {
        self.label_seen = false;
        self.label_row = None;
        self.label_group = None;
        self.unnamed_group = None;
    }

    /// 空白列只清除「看過名稱列」旗標
    pub fn clear_label_seen(&mut self) {
        self.label_seen = false;
    }

    /// 期間名稱列 (例如 "Low Season") 開一個新群組
    pub fn open_label(&mut self, hotel: &mut Hotel, name: &str, row_index: usize) {
        hotel.period_groups.push(PeriodGroup::new(name.trim()));
        self.label_seen = true;
        self.label_row = Some(row_index);
        self.label_group = Some(hotel.period_groups.len() - 1);
        self.unnamed_group = None;
    }

    fn label_in_reach(&self, row_index: usize) -> Option<usize> {
        if !self.label_seen {
            return None;
        }
        let label_row = self.label_row?;
        if row_index.saturating_sub(label_row) <= self.proximity_window {
            self.label_group
        } else {
            None
        }
    }

    fn new_period(&mut self, range: DateRange, label: Option<&str>) -> Period {
        Period {
            id: self.ids.allocate(),
            label: label.map(str::to_string),
            start_date: range.start,
            end_date: range.end,
        }
    }

    /// 括號區間：附近有名稱列就歸入該群組，否則放進未命名群組
    ///
    /// 回傳新建立的期間編號。
    pub fn assign_ranges(
        &mut self,
        hotel: &mut Hotel,
        ranges: &[DateRange],
        row_index: usize,
    ) -> Vec<PeriodId> {
        let target = match self.label_in_reach(row_index) {
            Some(index) => index,
            None => match self.unnamed_group {
                Some(index) => index,
                None => {
                    // 在第一個區間時才建立未命名群組
                    if ranges.is_empty() {
                        return Vec::new();
                    }
                    hotel
                        .period_groups
                        .push(PeriodGroup::new(self.unnamed_group_name.clone()));
                    let index = hotel.period_groups.len() - 1;
                    self.unnamed_group = Some(index);
                    index
                }
            },
        };

        let mut ids = Vec::with_capacity(ranges.len());
        for range in ranges {
            let period = self.new_period(*range, None);
            ids.push(period.id);
            hotel.period_groups[target].periods.push(period);
        }
        ids
    }

    /// 冒號標籤區間：沿用同名群組，沒有就新建
    pub fn assign_labeled(&mut self, hotel: &mut Hotel, label: &str, range: DateRange) -> PeriodId {
        let index = match hotel.period_groups.iter().position(|group| group.name == label) {
            Some(index) => index,
            None => {
                hotel.period_groups.push(PeriodGroup::new(label));
                hotel.period_groups.len() - 1
            }
        };
        self.unnamed_group = None;

        let period = self.new_period(range, Some(label));
        let id = period.id;
        hotel.period_groups[index].periods.push(period);
        id
    }
}
